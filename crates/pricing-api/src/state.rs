//! # Application State
//!
//! Shared state for the Axum application: the store, the quote signer and
//! process configuration.

use crate::signing::QuoteSigner;
use crate::store::{InMemoryStore, SharedStore, StoreSnapshot};
use pricing_core::StoreData;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_STORE_PATHS: [&str; 3] = [
    "config/store.toml",
    "../config/store.toml",
    "../../config/store.toml",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Explicit store file, overriding the default search paths
    pub store_config: Option<PathBuf>,
    /// HMAC key for quote signatures
    pub quote_signing_secret: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            store_config: std::env::var("STORE_CONFIG").ok().map(PathBuf::from),
            quote_signing_secret: std::env::var("QUOTE_SIGNING_SECRET")
                .unwrap_or_else(|_| "dev-quote-secret".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            store_config: None,
            quote_signing_secret: "dev-quote-secret".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub signer: QuoteSigner,
    pub config: AppConfig,
}

impl AppState {
    /// Build state from the environment and the store file
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        if config.is_production() && config.quote_signing_secret == AppConfig::default().quote_signing_secret {
            anyhow::bail!("QUOTE_SIGNING_SECRET must be set in production");
        }

        let data = load_store_data(config.store_config.as_deref())?;
        Ok(Self::from_store_data(data, config))
    }

    /// Build state around an already-loaded store
    pub fn from_store_data(data: StoreData, config: AppConfig) -> Self {
        Self {
            store: InMemoryStore::shared(StoreSnapshot::from(data)),
            signer: QuoteSigner::new(config.quote_signing_secret.clone()),
            config,
        }
    }
}

/// Load the store file: the explicit path if given, otherwise the first of
/// the default locations that exists. No file means an empty store.
fn load_store_data(explicit: Option<&Path>) -> anyhow::Result<StoreData> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        return parse_store(&content, &path.display().to_string());
    }

    for path in DEFAULT_STORE_PATHS {
        if let Ok(content) = std::fs::read_to_string(path) {
            return parse_store(&content, path);
        }
    }

    warn!("No store file found, starting with an empty store");
    Ok(StoreData::default())
}

fn parse_store(content: &str, origin: &str) -> anyhow::Result<StoreData> {
    let data = StoreData::from_toml(content).map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", origin, e))?;
    info!(
        products = data.products.len(),
        coupons = data.coupons.len(),
        "Loaded store from {}",
        origin
    );
    Ok(data)
}
