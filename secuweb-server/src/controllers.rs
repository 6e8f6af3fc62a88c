use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
    extract::{Extension, Query, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use secuweb_core::{CreateMessageRequest, Message as ChatMessage, MessageQuery, QuerySelection};
use std::sync::Arc;
use tracing::error;

use crate::{error::AppError, AppState};

/// Handler per GET /messages
///
/// Un solo filtro per richiesta, in ordine username, content, room; senza
/// filtri restituisce gli ultimi 100 messaggi di tutte le stanze.
pub async fn list_messages(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<MessageQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let repo = &state.repository;
    let result = match params.selection() {
        QuerySelection::Username(raw) => repo.find_by_username(raw).await,
        QuerySelection::Content(raw) => repo.find_by_content(raw).await,
        QuerySelection::Room(raw) => repo.find_by_room(raw).await,
        QuerySelection::All => repo.find_all().await,
    };

    result.map(Json).map_err(|e| {
        error!("Error fetching messages: {}", e);
        AppError::FetchFailed
    })
}

/// Handler per POST /messages
pub async fn create_message(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    // il corpo viene letto a mano: un JSON non valido è un 400 con messaggio statico
    let req: CreateMessageRequest = serde_json::from_slice(&body).map_err(|e| {
        error!("Error parsing message body: {}", e);
        AppError::MalformedPayload
    })?;

    let content = req.content.unwrap_or_default();
    let username = req.username.unwrap_or_default();
    if content.is_empty() || username.is_empty() {
        return Err(AppError::MissingFields);
    }

    let message = state
        .repository
        .create(&content, &username, req.room.as_deref())
        .await
        .map_err(|e| {
            error!("Error creating message: {}", e);
            AppError::CreateFailed
        })?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Handler per /ws
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Nessuna autenticazione: il nome utente viaggia dentro ogni send-message.
    // `rx` riceve gli eventi già serializzati destinati a questa sessione.
    let gateway = state.gateway.clone();
    let (conn_id, mut rx) = gateway.connect();

    /* socket.split() divide l'oggetto WebSocket in due metà indipendenti:
        sender (un Sink) usato per inviare messaggi verso il client,
        receiver (uno Stream) usato per ricevere messaggi dal client. */
    let (mut sender, mut receiver) = socket.split();

    // Task: forward events from rx -> websocket
    let forward_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Eventi del client gestiti uno alla volta, nell'ordine di arrivo
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(t) => gateway.handle_text(&conn_id, &t).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    // cleanup: dropping the sender ends the forward task
    gateway.disconnect(&conn_id);
    let _ = forward_task.await;
}
