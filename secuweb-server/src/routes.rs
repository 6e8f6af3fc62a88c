use axum::{routing::get, Router, Extension};
use std::sync::Arc;

use crate::{AppState, health_with_store};
use crate::controllers;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|Extension(state): Extension<Arc<AppState>>| async move {
            health_with_store(state.repository.store().as_ref()).await
        }))
        // /api/messages è il percorso chiamato dal frontend
        .route("/messages", get(controllers::list_messages).post(controllers::create_message))
        .route("/api/messages", get(controllers::list_messages).post(controllers::create_message))
        .route("/ws", get(controllers::ws_handler))
        .layer(Extension(state))
}
