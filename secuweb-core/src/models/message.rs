use serde::{Deserialize, Serialize};

/// Stanza di default quando il client non ne indica una.
pub const DEFAULT_ROOM: &str = "general";

/// Messaggio persistito dal server e notificato via WS.
///
/// I nomi dei campi ricalcano quelli del documento salvato (`_id` compreso),
/// così HTTP e WS restituiscono lo stesso JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    pub username: String,
    pub timestamp: String, // RFC3339 UTC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Message {
    /// Stanza effettiva del messaggio, `general` se assente.
    pub fn room_or_default(&self) -> &str {
        match self.room.as_deref() {
            Some(room) if !room.is_empty() => room,
            _ => DEFAULT_ROOM,
        }
    }
}
