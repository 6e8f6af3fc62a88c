//! secuweb-core: tipi condivisi tra client e server (modelli, DTO HTTP, messaggi WS, errori).
//! Niente I/O o dipendenze non compatibili con WASM.

pub mod models;
pub mod protocol;
pub mod error;
pub mod utils;

// Re-export utili per ridurre i percorsi nel crate server
pub use error::ErrorBody;
pub use models::{Message, DEFAULT_ROOM};
pub use protocol::ws::{SearchField, SearchMessages, SendMessage, WsMessage};
pub use protocol::http::{CreateMessageRequest, MessageQuery, QuerySelection};
pub use utils::{format_timestamp, new_connection_id, now_timestamp, timestamp_from_millis};
