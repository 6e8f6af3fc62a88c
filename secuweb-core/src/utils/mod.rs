pub mod ids;
pub mod time;

pub use ids::new_connection_id;
pub use self::time::{format_timestamp, now_timestamp, timestamp_from_millis};
