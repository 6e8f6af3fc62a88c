use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    Client, Collection, Database,
};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{FindOptions, MessageStore, StoreError, MESSAGES_COLLECTION};

/// MongoDB backend.
///
/// Handle creato al primo uso e poi condiviso da tutte le richieste. I chiamanti
/// concorrenti attendono la stessa inizializzazione in corso.
///
/// "Al massimo una connessione" vale solo se quel tentativo riesce: se fallisce
/// la cella resta vuota e il prossimo chiamante, anche uno già in attesa, apre
/// un nuovo tentativo. Con uno store irraggiungibile i tentativi sono quindi
/// uno per chiamante, in sequenza.
pub struct MongoStore {
    uri: String,
    db_name: String,
    db: OnceCell<Database>,
}

impl MongoStore {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            db: OnceCell::new(),
        }
    }

    /// Whether the shared connection has been established yet.
    pub fn is_connected(&self) -> bool {
        self.db.initialized()
    }

    async fn database(&self) -> Result<&Database, StoreError> {
        self.db
            .get_or_try_init(|| async {
                info!("Connecting to document store, database {}", self.db_name);
                let client = Client::with_uri_str(&self.uri).await?;
                Ok::<_, StoreError>(client.database(&self.db_name))
            })
            .await
    }

    async fn collection(&self) -> Result<Collection<Document>, StoreError> {
        Ok(self.database().await?.collection(MESSAGES_COLLECTION))
    }
}

#[async_trait]
impl MessageStore for MongoStore {
    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        debug!("find {}", filter);
        let collection = self.collection().await?;
        let mut find = collection.find(filter);
        if options.newest_first {
            find = find.sort(doc! { "timestamp": -1 });
        }
        if let Some(limit) = options.limit {
            find = find.limit(limit);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_one(&self, doc: Document) -> Result<Bson, StoreError> {
        let result = self.collection().await?.insert_one(doc).await?;
        Ok(result.inserted_id)
    }

    async fn insert_many(&self, docs: Vec<Document>) -> Result<usize, StoreError> {
        if docs.is_empty() {
            return Ok(0);
        }
        let result = self.collection().await?.insert_many(docs).await?;
        Ok(result.inserted_ids.len())
    }

    async fn delete_one(&self, filter: Document) -> Result<u64, StoreError> {
        let result = self.collection().await?.delete_one(filter).await?;
        Ok(result.deleted_count)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection().await?.count_documents(doc! {}).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database().await?.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
