//! Demo data inserted at startup so searches have something to find.

use mongodb::bson::{doc, DateTime, Document};
use tracing::info;

use crate::store::{MessageStore, StoreError};

// (content, username, room, unix millis)
const DEMO_MESSAGES: [(&str, &str, &str, i64); 10] = [
    ("Bonjour tout le monde !", "alice", "general", 1_705_312_800_000),
    ("Salut Alice !", "bob", "general", 1_705_312_860_000),
    ("Comment ça va ?", "alice", "general", 1_705_312_920_000),
    ("Très bien merci !", "bob", "general", 1_705_312_980_000),
    ("Quelqu'un a des nouvelles du projet ?", "admin", "tech", 1_705_316_400_000),
    ("Oui, on avance bien !", "developer", "tech", 1_705_316_460_000),
    ("Parfait !", "admin", "tech", 1_705_316_520_000),
    ("Test de la nouvelle fonctionnalité", "tester", "testing", 1_705_320_000_000),
    ("Fonctionne parfaitement !", "developer", "testing", 1_705_320_060_000),
    ("Super !", "tester", "testing", 1_705_320_120_000),
];

pub fn demo_documents() -> Vec<Document> {
    DEMO_MESSAGES
        .iter()
        .map(|(content, username, room, millis)| {
            doc! {
                "content": *content,
                "username": *username,
                "room": *room,
                "timestamp": DateTime::from_millis(*millis),
            }
        })
        .collect()
}

/// Inserts the demo messages unless the collection already has documents.
/// Returns how many were inserted.
pub async fn seed_test_data(store: &dyn MessageStore) -> Result<usize, StoreError> {
    let existing = store.count().await?;
    if existing > 0 {
        info!("Demo data already present ({} messages)", existing);
        return Ok(0);
    }

    let inserted = store.insert_many(demo_documents()).await?;
    info!("Inserted {} demo messages", inserted);
    Ok(inserted)
}
