//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use auth_server::config::{ListenerConfig, ServerConfig, StoreDriver};
use auth_server::lifecycle::Shutdown;
use auth_server::net::{AdmissionController, Listener};
use auth_server::server::{AuthServer, ShutdownReport};
use auth_server::store::MemoryStore;
use auth_server::AuthClient;

/// A server on an ephemeral port backed by the in-memory store.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub admission: Arc<AdmissionController>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<ShutdownReport>,
}

impl TestServer {
    pub fn client(&self) -> AuthClient {
        AuthClient::new(self.addr)
    }

    /// Trigger shutdown and wait for the drain to finish.
    pub async fn stop(self) -> ShutdownReport {
        self.shutdown.trigger();
        self.handle.await.unwrap()
    }
}

pub fn test_config(max_clients: usize, slot_release_delay: Duration) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener = ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_clients,
    };
    config.worker.slot_release_delay_ms = slot_release_delay.as_millis() as u64;
    config.worker.drain_timeout_secs = 10;
    config.store.driver = StoreDriver::Memory;
    config
}

pub async fn start_server(max_clients: usize, slot_release_delay: Duration) -> TestServer {
    let config = test_config(max_clients, slot_release_delay);
    let store = Arc::new(MemoryStore::new());
    let server = AuthServer::new(&config, Arc::clone(&store));
    let admission = server.admission();

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        store,
        admission,
        shutdown,
        handle,
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
