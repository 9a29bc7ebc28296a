//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the auth server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, client limit).
    pub listener: ListenerConfig,

    /// Per-connection worker settings.
    pub worker: WorkerConfig,

    /// Store connection parameters.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Maximum concurrently processed clients. Extra clients get `TooManyClients`.
    pub max_clients: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            max_clients: 10,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Pause between sending a response and freeing the admission slot, in milliseconds.
    pub slot_release_delay_ms: u64,

    /// How long shutdown waits for in-flight workers, in seconds. 0 waits
    /// until every worker has finished.
    pub drain_timeout_secs: u64,
}

impl WorkerConfig {
    pub fn slot_release_delay(&self) -> Duration {
        Duration::from_millis(self.slot_release_delay_ms)
    }

    /// `None` means no deadline.
    pub fn drain_timeout(&self) -> Option<Duration> {
        (self.drain_timeout_secs > 0).then(|| Duration::from_secs(self.drain_timeout_secs))
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            slot_release_delay_ms: 10_000,
            drain_timeout_secs: 30,
        }
    }
}

/// Which store backend to open connections against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreDriver {
    #[default]
    Postgres,
    /// In-process tables, nothing persisted.
    Memory,
}

/// Store connection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub driver: StoreDriver,

    /// Connection URL (e.g., "postgres://localhost:5432/signin").
    pub url: String,

    /// Login user; overrides the URL's user when set.
    pub user: String,

    /// Login password; overrides the URL's password when set.
    pub password: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: StoreDriver::Postgres,
            url: "postgres://localhost:5432/signin".to_string(),
            user: String::new(),
            password: String::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
