//! Gateway real-time: connessioni, stanze e dispatch degli eventi WS.
//! Gli errori tornano solo al mittente come evento `error` generico.

use std::collections::HashSet;

use dashmap::DashMap;
use secuweb_core::{new_connection_id, SearchMessages, SendMessage, WsMessage};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};

use crate::repository::MessageRepository;

pub type ConnectionId = String;

pub const SEND_FAILED: &str = "Failed to send message";
pub const SEARCH_FAILED: &str = "Failed to search messages";

pub struct Gateway {
    repository: MessageRepository,
    /// Map of connection id -> sender used to forward events to that websocket session.
    connections: DashMap<ConnectionId, UnboundedSender<String>>,
    /// Map of room name -> connections currently joined.
    rooms: DashMap<String, HashSet<ConnectionId>>,
}

impl Gateway {
    pub fn new(repository: MessageRepository) -> Self {
        Self {
            repository,
            connections: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    pub fn repository(&self) -> &MessageRepository {
        &self.repository
    }

    /// Registers a new connection. The receiver yields serialized outgoing
    /// events and ends once the connection is dropped by [`Gateway::disconnect`].
    pub fn connect(&self) -> (ConnectionId, UnboundedReceiver<String>) {
        let id = new_connection_id();
        let (tx, rx) = unbounded_channel::<String>();
        self.connections.insert(id.clone(), tx);
        info!("User connected: {}", id);
        (id, rx)
    }

    /// Removes the connection from every room and forgets its sender.
    pub fn disconnect(&self, conn: &str) {
        self.rooms.retain(|_, members| {
            members.remove(conn);
            !members.is_empty()
        });
        self.connections.remove(conn);
        info!("User disconnected: {}", conn);
    }

    pub fn is_connected(&self, conn: &str) -> bool {
        self.connections.contains_key(conn)
    }

    pub fn join(&self, conn: &str, room: &str) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn.to_string());
        info!("User {} joined room: {}", conn, room);
    }

    /// Connections currently in `room`.
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Rooms `conn` has joined.
    pub fn rooms_of(&self, conn: &str) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|entry| entry.value().contains(conn))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Parses one text frame and dispatches it. Frames that are not a known
    /// event envelope are ignored.
    pub async fn handle_text(&self, conn: &str, text: &str) {
        match serde_json::from_str::<WsMessage>(text) {
            Ok(event) => self.dispatch(conn, event).await,
            Err(e) => debug!("ignoring frame from {}: {}", conn, e),
        }
    }

    pub async fn dispatch(&self, conn: &str, event: WsMessage) {
        match event {
            WsMessage::JoinRoom(room) => self.join(conn, &room),
            WsMessage::SendMessage(sm) => self.send_message(conn, sm).await,
            WsMessage::SearchMessages(query) => self.search_messages(conn, query).await,
            // server -> client events have no meaning when received
            other => debug!("ignoring server event from {}: {:?}", conn, other),
        }
    }

    async fn send_message(&self, conn: &str, sm: SendMessage) {
        // campi non stringa: niente da salvare
        let Some((content, username, room)) = sm.text_fields() else {
            error!("Error sending message: non-text field from {}", conn);
            self.emit(conn, &WsMessage::Error(SEND_FAILED.to_string()));
            return;
        };
        match self.repository.create(content, username, room).await {
            Ok(message) => {
                let room = message.room_or_default().to_string();
                let delivered = self.broadcast(&room, &WsMessage::NewMessage(message));
                info!("Message sent in room {} ({} recipients)", room, delivered);
            }
            Err(e) => {
                error!("Error sending message: {}", e);
                self.emit(conn, &WsMessage::Error(SEND_FAILED.to_string()));
            }
        }
    }

    async fn search_messages(&self, conn: &str, query: SearchMessages) {
        match self.repository.search(query.field, &query.value).await {
            Ok(messages) => {
                self.emit(conn, &WsMessage::SearchResults(messages));
            }
            Err(e) => {
                error!("Error searching messages: {}", e);
                self.emit(conn, &WsMessage::Error(SEARCH_FAILED.to_string()));
            }
        }
    }

    /// Sends an event to a single connection. Returns false if it is gone.
    pub fn emit(&self, conn: &str, event: &WsMessage) -> bool {
        let Some(text) = encode(event) else {
            return false;
        };
        match self.connections.get(conn) {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }

    /// Sends an event to every member of `room`; returns how many got it.
    pub fn broadcast(&self, room: &str, event: &WsMessage) -> usize {
        let Some(text) = encode(event) else {
            return 0;
        };
        // write guard: broadcasts to one room go out one after the other
        let Some(members) = self.rooms.get_mut(room) else {
            return 0;
        };
        members
            .iter()
            .filter(|member| {
                self.connections
                    .get(member.as_str())
                    .is_some_and(|tx| tx.send(text.clone()).is_ok())
            })
            .count()
    }
}

fn encode(event: &WsMessage) -> Option<String> {
    serde_json::to_string(event)
        .map_err(|e| error!("cannot encode event: {}", e))
        .ok()
}
