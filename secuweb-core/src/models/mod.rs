pub mod message;

// Re-export per comodità
pub use message::{Message, DEFAULT_ROOM};
