/* This file defines how data "travel" through the web socket
    WsMessage is an enum for the envelope { type, payload }, one variant per named event:
    JoinRoom, SendMessage, SearchMessages -> from client
    NewMessage -> broadcast from server to every member of a room
    SearchResults, Error -> from server to the requesting connection only
*/
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Message;

/// Messaggio WS con envelope { type, payload }.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    /// Client → Server: entra nella stanza indicata.
    #[serde(rename = "join-room")]
    JoinRoom(String),
    /// Client → Server: richiesta di inviare un messaggio.
    #[serde(rename = "send-message")]
    SendMessage(SendMessage),
    /// Server → membri della stanza: messaggio persistito.
    #[serde(rename = "new-message")]
    NewMessage(Message),
    /// Client → Server: ricerca sull'intera collezione.
    #[serde(rename = "search-messages")]
    SearchMessages(SearchMessages),
    /// Server → Client: risultati, solo per chi ha cercato.
    #[serde(rename = "search-results")]
    SearchResults(Vec<Message>),
    /// Server → Client: errore generico leggibile.
    #[serde(rename = "error")]
    Error(String),
}

/// Payload per l'intento di invio messaggio (C→S).
///
/// Nessun campo è obbligatorio né tipizzato: il payload arriva così com'è e
/// solo [`SendMessage::text_fields`] decide se è utilizzabile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub username: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub room: Value,
}

impl SendMessage {
    pub fn new(content: &str, username: &str, room: Option<&str>) -> Self {
        Self {
            content: Value::from(content),
            username: Value::from(username),
            room: room.map(Value::from).unwrap_or(Value::Null),
        }
    }

    /// (content, username, room) come testo. Un campo assente vale stringa vuota
    /// (stanza: nessuna); `None` se un campo è presente ma non è una stringa.
    pub fn text_fields(&self) -> Option<(&str, &str, Option<&str>)> {
        fn text(v: &Value) -> Option<Option<&str>> {
            match v {
                Value::Null => Some(None),
                Value::String(s) => Some(Some(s.as_str())),
                _ => None,
            }
        }

        let content = text(&self.content)?.unwrap_or("");
        let username = text(&self.username)?.unwrap_or("");
        let room = text(&self.room)?;
        Some((content, username, room))
    }
}

/// Campo su cui cercare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Username,
    Content,
    Room,
    /// Qualsiasi altro valore: risultato vuoto.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Payload della ricerca (C→S).
///
/// `value` resta JSON grezzo: una stringa passa per il parse-or-literal del
/// repository, qualsiasi altro valore diventa direttamente il criterio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMessages {
    #[serde(rename = "type", default)]
    pub field: SearchField,
    #[serde(default)]
    pub value: Value,
}
