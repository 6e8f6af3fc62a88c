//! Store in memoria, ordine di inserimento. I filtri passano da
//! [`matcher::matches`]; i pattern `$regex` seguono la sintassi del crate `regex`
//! (niente lookaround o backreference, a differenza di MongoDB).

use std::cmp::Reverse;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use super::{matcher, FindOptions, MessageStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored document, in insertion order.
    pub async fn all(&self) -> Vec<Document> {
        self.docs.read().await.clone()
    }
}

fn with_id(doc: Document) -> (Bson, Document) {
    if let Some(id) = doc.get("_id") {
        return (id.clone(), doc);
    }
    let id = Bson::ObjectId(ObjectId::new());
    // `_id` goes first, like the real store does
    let mut stored = Document::new();
    stored.insert("_id", id.clone());
    for (key, value) in doc {
        stored.insert(key, value);
    }
    (id, stored)
}

fn timestamp_millis(doc: &Document) -> Option<i64> {
    match doc.get("timestamp") {
        Some(Bson::DateTime(at)) => Some(at.timestamp_millis()),
        _ => None,
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;
        let mut found = Vec::new();
        for doc in docs.iter() {
            if matcher::matches(doc, &filter)? {
                found.push(doc.clone());
            }
        }
        drop(docs);

        if options.newest_first {
            // stable: equal timestamps keep insertion order, missing ones go last
            found.sort_by_key(|doc| Reverse(timestamp_millis(doc)));
        }
        if let Some(limit) = options.limit.filter(|l| *l != 0) {
            found.truncate(limit.unsigned_abs() as usize);
        }
        Ok(found)
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson, StoreError> {
        let (id, stored) = with_id(doc);
        self.docs.write().await.push(stored);
        Ok(id)
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError> {
        let mut stored = self.docs.write().await;
        let n = docs.len();
        stored.extend(docs.into_iter().map(|doc| with_id(doc).1));
        Ok(n)
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError> {
        let mut docs = self.docs.write().await;
        let mut position = None;
        for (i, doc) in docs.iter().enumerate() {
            if matcher::matches(doc, &filter)? {
                position = Some(i);
                break;
            }
        }
        Ok(match position {
            Some(i) => {
                docs.remove(i);
                1
            }
            None => 0,
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.docs.read().await.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
