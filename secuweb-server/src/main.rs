use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

// ri-utilizziamo le funzioni e strutture definite in lib.rs
use secuweb_server::{
    config::Config,
    routes,
    seed::seed_test_data,
    shutdown_signal,
    store::{MemoryStore, MessageStore, MongoStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("load configuration")?;

    // `--memory` evita MongoDB: utile per provare l'app in locale
    let in_memory = std::env::args().nth(1).as_deref() == Some("--memory");
    let store: Arc<dyn MessageStore> = if in_memory {
        info!("Using in-memory document store");
        Arc::new(MemoryStore::new())
    } else {
        info!("Using document store database {}", config.mongodb_db);
        Arc::new(MongoStore::new(config.mongodb_uri.clone(), config.mongodb_db.clone()))
    };

    // i dati demo non sono indispensabili: un errore non ferma il server
    if config.seed_data {
        if let Err(e) = seed_test_data(store.as_ref()).await {
            error!("Error seeding demo data: {}", e);
        }
    }

    let state = Arc::new(AppState::new(store));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("bind tcp listener")?;
    info!("Ready on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;

    info!("Server stopped");
    Ok(())
}
