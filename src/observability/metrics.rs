//! Metrics collection and exposition.
//!
//! # Metrics
//! - `auth_connections_total` (counter): accepted connections by `verdict`
//! - `auth_responses_total` (counter): responses sent by `tag`
//! - `auth_active_clients` (gauge): outstanding admission slots
//! - `auth_pool_idle_connections` (gauge): idle pooled store connections
//! - `auth_pool_opened_total` (counter): store connections opened

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission(verdict: &'static str) {
    metrics::counter!("auth_connections_total", "verdict" => verdict).increment(1);
}

pub fn record_response(tag: &'static str) {
    metrics::counter!("auth_responses_total", "tag" => tag).increment(1);
}

pub fn set_active_clients(active: usize) {
    metrics::gauge!("auth_active_clients").set(active as f64);
}

pub fn set_pool_idle(idle: usize) {
    metrics::gauge!("auth_pool_idle_connections").set(idle as f64);
}

pub fn record_pool_open() {
    metrics::counter!("auth_pool_opened_total").increment(1);
}
