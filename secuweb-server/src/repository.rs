//! Repository dei messaggi. Le ricerche sono parse-or-literal: un input che è
//! JSON valido diventa il criterio così com'è, altrimenti si confronta il testo.

use std::sync::Arc;

use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use secuweb_core::{timestamp_from_millis, Message, SearchField, DEFAULT_ROOM};
use serde_json::Value;
use thiserror::Error;

use crate::store::{FindOptions, MessageStore, StoreError};

/// Cap on every search and on the full listing.
pub const SEARCH_LIMIT: i64 = 100;

/// Longest username the strict lookup accepts, in characters.
pub const STRICT_USERNAME_MAX_CHARS: usize = 50;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Invalid {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Converts parsed JSON into BSON the way a JavaScript driver would serialize
/// it: integers that fit become Int32/Int64, every other number a Double,
/// objects stay plain documents (no extended-JSON interpretation).
pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => match i32::try_from(i) {
                Ok(small) => Bson::Int32(small),
                Err(_) => Bson::Int64(i),
            },
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => {
            let mut d = Document::new();
            for (key, v) in map {
                d.insert(key, json_to_bson(v));
            }
            Bson::Document(d)
        }
    }
}

/// The parse step of parse-or-literal: `Some` when `raw` is any valid JSON value.
pub fn parse_criterion(raw: &str) -> Option<Bson> {
    serde_json::from_str::<Value>(raw).ok().map(json_to_bson)
}

/// Filter for a username search. Parsed JSON is used verbatim.
pub fn username_filter(raw: &str) -> Document {
    match parse_criterion(raw) {
        Some(criterion) => doc! { "username": criterion },
        None => doc! { "username": raw },
    }
}

/// Filter for a content search. The literal fallback is a case-insensitive
/// pattern built from the raw input, unescaped.
pub fn content_filter(raw: &str) -> Document {
    match parse_criterion(raw) {
        Some(criterion) => doc! { "content": criterion },
        None => doc! { "content": { "$regex": raw, "$options": "i" } },
    }
}

/// Filter for a room search. Parsed JSON is used verbatim.
pub fn room_filter(raw: &str) -> Document {
    match parse_criterion(raw) {
        Some(criterion) => doc! { "room": criterion },
        None => doc! { "room": raw },
    }
}

fn field_name(field: SearchField) -> Option<&'static str> {
    match field {
        SearchField::Username => Some("username"),
        SearchField::Content => Some("content"),
        SearchField::Room => Some("room"),
        SearchField::Unknown => None,
    }
}

fn string_field(doc: &Document, key: &str) -> String {
    match doc.get(key) {
        Some(Bson::String(s)) => s.clone(),
        None | Some(Bson::Null) => String::new(),
        Some(other) => other.clone().into_relaxed_extjson().to_string(),
    }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.clone().into_relaxed_extjson().to_string(),
    }
}

/// Converts a stored document to the wire model, tolerating odd shapes.
pub fn message_from_document(doc: &Document) -> Message {
    let timestamp = match doc.get("timestamp") {
        Some(Bson::DateTime(at)) => timestamp_from_millis(at.timestamp_millis()),
        _ => string_field(doc, "timestamp"),
    };
    let room = match doc.get("room") {
        None | Some(Bson::Null) => None,
        Some(_) => Some(string_field(doc, "room")),
    };
    Message {
        id: doc.get("_id").map(id_to_string),
        content: string_field(doc, "content"),
        username: string_field(doc, "username"),
        timestamp,
        room,
    }
}

#[derive(Clone)]
pub struct MessageRepository {
    store: Arc<dyn MessageStore>,
}

impl MessageRepository {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Message>, RepositoryError> {
        let docs = self.store.find(filter, options).await?;
        Ok(docs.iter().map(message_from_document).collect())
    }

    pub async fn find_by_username(&self, raw: &str) -> Result<Vec<Message>, RepositoryError> {
        self.find(username_filter(raw), FindOptions::limited(SEARCH_LIMIT)).await
    }

    pub async fn find_by_content(&self, raw: &str) -> Result<Vec<Message>, RepositoryError> {
        self.find(content_filter(raw), FindOptions::limited(SEARCH_LIMIT)).await
    }

    pub async fn find_by_room(&self, raw: &str) -> Result<Vec<Message>, RepositoryError> {
        self.find(room_filter(raw), FindOptions::limited(SEARCH_LIMIT)).await
    }

    /// Ricerca dal canale real-time. Una stringa passa dal parse-or-literal del
    /// campo; qualsiasi altro valore JSON è già strutturato e diventa il criterio
    /// senza conversioni. Campo sconosciuto: nessun risultato.
    pub async fn search(&self, field: SearchField, value: &Value) -> Result<Vec<Message>, RepositoryError> {
        let Some(name) = field_name(field) else {
            return Ok(Vec::new());
        };
        let filter = match value {
            Value::String(raw) => match field {
                SearchField::Content => content_filter(raw),
                SearchField::Room => room_filter(raw),
                _ => username_filter(raw),
            },
            other => {
                let mut filter = Document::new();
                filter.insert(name, json_to_bson(other.clone()));
                filter
            }
        };
        self.find(filter, FindOptions::limited(SEARCH_LIMIT)).await
    }

    /// Hardened username lookup: only a JSON string of at most 50 characters,
    /// always matched literally, no result cap.
    pub async fn find_by_username_strict(&self, input: &Value) -> Result<Vec<Message>, RepositoryError> {
        let username = match input {
            Value::String(s) if s.chars().count() <= STRICT_USERNAME_MAX_CHARS => s.as_str(),
            _ => return Err(RepositoryError::InvalidInput("username")),
        };
        self.find(doc! { "username": username }, FindOptions::default()).await
    }

    /// Persists a new message. No validation on content or username; an
    /// absent or empty room becomes `general`. The timestamp is always
    /// assigned here.
    pub async fn create(&self, content: &str, username: &str, room: Option<&str>) -> Result<Message, RepositoryError> {
        let room = room.filter(|r| !r.is_empty()).unwrap_or(DEFAULT_ROOM);
        let now = DateTime::now();
        let doc = doc! {
            "content": content,
            "username": username,
            "room": room,
            "timestamp": now,
        };
        let id = self.store.insert_one(doc).await?;
        Ok(Message {
            id: Some(id_to_string(&id)),
            content: content.to_string(),
            username: username.to_string(),
            timestamp: timestamp_from_millis(now.timestamp_millis()),
            room: Some(room.to_string()),
        })
    }

    /// Up to 100 most recent messages, across every room.
    pub async fn find_all(&self) -> Result<Vec<Message>, RepositoryError> {
        self.find(doc! {}, FindOptions::limited(SEARCH_LIMIT).newest_first()).await
    }

    /// Deletes one message. `id` is matched as an ObjectId when it is one,
    /// otherwise as a plain string id. Returns whether a document was removed.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool, RepositoryError> {
        let filter = match ObjectId::parse_str(id) {
            Ok(oid) => doc! { "_id": oid },
            Err(_) => doc! { "_id": id },
        };
        Ok(self.store.delete_one(filter).await? > 0)
    }
}
