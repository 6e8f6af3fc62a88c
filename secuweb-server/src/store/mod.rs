//! Store della collezione `messages`: [`MongoStore`] (MongoDB) e [`MemoryStore`]
//! (test e `--memory`). I filtri sono documenti BSON passati così come sono.

pub mod matcher;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use thiserror::Error;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Name of the only collection the application uses.
pub const MESSAGES_COLLECTION: &str = "messages";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document store error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("bad query: {0}")]
    BadQuery(String),
}

/// Cursor options for [`MessageStore::find`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum number of documents; `None` means no cap.
    pub limit: Option<i64>,
    /// Sort by `timestamp` descending instead of natural order.
    pub newest_first: bool,
}

impl FindOptions {
    pub fn limited(limit: i64) -> Self {
        Self { limit: Some(limit), newest_first: false }
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Returns the documents matching `filter`.
    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, StoreError>;

    /// Inserts one document and returns its `_id`.
    async fn insert_one(&self, doc: Document) -> Result<Bson, StoreError>;

    /// Inserts a batch, returning how many were written.
    async fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError>;

    /// Removes the first document matching `filter`; returns the removed count (0 or 1).
    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Round-trip to the backend, used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}
