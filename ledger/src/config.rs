//! Configuration management for the event ledger.
//!
//! Loads configuration from environment variables with sensible defaults.

use petal_runtime::StoreConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Per-event store configuration
    pub store: StoreSettings,
    /// Inventory configuration
    pub inventory: InventoryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log filter (trace, debug, info, warn, error, or an `EnvFilter` directive)
    pub log_level: String,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Bound on effect feedback rounds per command
    pub max_feedback_rounds: usize,
}

/// Inventory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// JSON file mapping product ids to starting quantities
    pub seed_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server: ServerConfig {
                host: lookup("PETAL_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("PETAL_PORT").and_then(|s| parse(&s)).unwrap_or(8080),
                log_level: lookup("PETAL_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            },
            store: StoreSettings {
                max_feedback_rounds: lookup("PETAL_MAX_FEEDBACK_ROUNDS")
                    .and_then(|s| parse(&s))
                    .unwrap_or_else(|| StoreConfig::default().max_feedback_rounds),
            },
            inventory: InventoryConfig {
                seed_path: lookup("PETAL_INVENTORY_SEED")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
            },
        }
    }

    /// Address the HTTP server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Store configuration derived from these settings
    #[must_use]
    pub const fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.store.max_feedback_rounds)
    }
}

fn parse<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}
