use serde::{Deserialize, Serialize};

/// Corpo JSON degli errori HTTP: `{ "error": "..." }`.
///
/// I messaggi sono statici, il dettaglio resta nei log del server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
