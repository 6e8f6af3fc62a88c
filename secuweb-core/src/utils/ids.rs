use uuid::Uuid;

/// Genera un identificativo di connessione WS unico (UUIDv4) come stringa.
pub fn new_connection_id() -> String {
    Uuid::new_v4().to_string()
}
