//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Bind the listener before anything touches the store
//! - Build the configured store backend and run the server until shutdown
//!
//! # Design Decisions
//! - Fail fast: a bind failure or unusable store URL is fatal
//! - No store connection is opened at startup; the pool opens lazily

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ServerConfig, StoreDriver};
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;
use crate::server::{AuthServer, ShutdownReport};
use crate::store::{MemoryStore, PgStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),
}

/// Run the server described by `config` until `shutdown` fires.
pub async fn run(config: ServerConfig, shutdown: Shutdown) -> Result<ShutdownReport, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;
    let signal = shutdown.subscribe();

    let report = match config.store.driver {
        StoreDriver::Postgres => {
            let store = Arc::new(PgStore::from_config(&config.store)?);
            AuthServer::new(&config, store).run(listener, signal).await
        }
        StoreDriver::Memory => {
            tracing::warn!("Using the in-memory store; accounts are lost on exit");
            let store = Arc::new(MemoryStore::new());
            AuthServer::new(&config, store).run(listener, signal).await
        }
    };

    Ok(report)
}
