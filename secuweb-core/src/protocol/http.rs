use serde::{Deserialize, Serialize};

/*
    http dto for http requests
*/
// GET /messages: il primo parametro non vuoto vince (username, content, room)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

/// Ricerca selezionata da una [`MessageQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySelection<'a> {
    Username(&'a str),
    Content(&'a str),
    Room(&'a str),
    All,
}

impl MessageQuery {
    /// Sceglie la ricerca in ordine di priorità; un valore vuoto conta come assente.
    pub fn selection(&self) -> QuerySelection<'_> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }

        if let Some(username) = present(&self.username) {
            QuerySelection::Username(username)
        } else if let Some(content) = present(&self.content) {
            QuerySelection::Content(content)
        } else if let Some(room) = present(&self.room) {
            QuerySelection::Room(room)
        } else {
            QuerySelection::All
        }
    }
}

// POST /messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}
