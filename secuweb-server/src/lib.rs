use axum::http::StatusCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

pub mod config;
pub mod controllers;
pub mod error;
pub mod gateway;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod store;

use gateway::Gateway;
use repository::MessageRepository;
use store::MessageStore;

#[derive(Clone)]
pub struct AppState {
    pub repository: MessageRepository,
    /// Rooms and connected websocket sessions.
    pub gateway: Arc<Gateway>,
}

impl AppState {
    /// HTTP e WS condividono lo stesso repository, quindi lo stesso store.
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        let repository = MessageRepository::new(store);
        let gateway = Arc::new(Gateway::new(repository.clone()));
        Self { repository, gateway }
    }
}

/// Controlla lo stato di salute del document store con un ping.
pub async fn health_with_store(store: &dyn MessageStore) -> StatusCode {
    match store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!("health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Completes on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
