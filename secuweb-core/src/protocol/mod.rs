pub mod ws;
pub mod http;

// Re-export comodi
pub use ws::{SearchField, SearchMessages, SendMessage, WsMessage};
pub use http::{CreateMessageRequest, MessageQuery, QuerySelection};
