//! Auth server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──TCP──▶ ┌──────────┐    ┌───────────┐    ┌──────────────┐
//!                     │ listener │───▶│ admission │───▶│ worker task  │
//!                     └──────────┘    └───────────┘    │ (one request)│
//!                                                      └──────┬───────┘
//!                                          admitted only      │
//!                                                             ▼
//!                                     ┌──────────────┐  ┌────────────┐
//!                                     │ auth service │─▶│ store pool │──▶ Postgres
//!                                     └──────────────┘  └────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use auth_server::config::{load_config, ServerConfig};
use auth_server::lifecycle::{startup, Shutdown};
use auth_server::observability::logging;

#[derive(Parser)]
#[command(name = "auth-server", version)]
#[command(about = "TCP sign-in / sign-up server with admission control", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("auth-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_clients = config.listener.max_clients,
        driver = ?config.store.driver,
        slot_release_delay_ms = config.worker.slot_release_delay_ms,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let report = startup::run(config, shutdown).await?;

    tracing::info!(
        closed_connections = report.closed_connections,
        abandoned_workers = report.abandoned_workers,
        "Shutdown complete"
    );
    Ok(())
}
