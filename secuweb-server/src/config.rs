use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/secuweb";
pub const DEFAULT_MONGODB_DB: &str = "secuweb";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub bind_addr: SocketAddr,
    /// Insert the demo messages at startup when the collection is empty.
    pub seed_data: bool,
}

impl Config {
    /// Legge la configurazione dalle variabili d'ambiente, con default per ognuna.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let bind = var("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr: SocketAddr = bind.parse().with_context(|| format!("parse BIND_ADDR {bind}"))?;

        let seed = var("SEED_DATA", "true");
        let seed_data = match seed.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => anyhow::bail!("invalid SEED_DATA value: {other}"),
        };

        Ok(Self {
            mongodb_uri: var("MONGODB_URI", DEFAULT_MONGODB_URI),
            mongodb_db: var("MONGODB_DB", DEFAULT_MONGODB_DB),
            bind_addr,
            seed_data,
        })
    }
}
