//! Accept loop and shutdown sequencing.
//!
//! # Responsibilities
//! - Accept connections until shutdown is signalled
//! - Stamp each connection with an admission verdict at accept time
//! - Spawn one worker task per connection, admitted or refused
//! - Drain workers and close pooled store connections on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::net::{AdmissionController, ConnectionTracker, Listener};
use crate::pool::ConnectionPool;
use crate::server::worker::{self, WorkerContext};
use crate::store::UserStore;

const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// What shutdown left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Idle store connections closed while shutting down.
    pub closed_connections: usize,
    /// Workers still running when the drain timeout expired.
    pub abandoned_workers: u64,
}

/// Serves sign-in and sign-up requests over TCP.
pub struct AuthServer<S: UserStore> {
    admission: Arc<AdmissionController>,
    tracker: ConnectionTracker,
    context: Arc<WorkerContext<S>>,
    drain_timeout: Option<Duration>,
}

impl<S: UserStore> AuthServer<S> {
    /// Wire the admission controller, pool and auth service around `store`.
    pub fn new(config: &ServerConfig, store: Arc<S>) -> Self {
        let pool = Arc::new(ConnectionPool::new(Arc::clone(&store)));
        let context = WorkerContext {
            auth: AuthService::new(store, pool),
            slot_release_delay: config.worker.slot_release_delay(),
        };
        Self {
            admission: Arc::new(AdmissionController::new(config.listener.max_clients)),
            tracker: ConnectionTracker::new(),
            context: Arc::new(context),
            drain_timeout: config.worker.drain_timeout(),
        }
    }

    pub fn admission(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.admission)
    }

    pub fn pool(&self) -> Arc<ConnectionPool<S>> {
        Arc::clone(self.context.auth.pool())
    }

    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> ShutdownReport {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(
                address = %addr,
                max_clients = self.admission.max_clients(),
                "Listening for connections"
            ),
            Err(e) => tracing::warn!(error = %e, "Listening on unknown address"),
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Stopped accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.dispatch(stream, peer),
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_PAUSE).await;
                    }
                }
            }
        }
        drop(listener);

        self.drain().await
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        let guard = self.tracker.track();
        let admission = self.admission.admit();
        let context = Arc::clone(&self.context);

        let span = tracing::info_span!(
            "worker",
            connection_id = %guard.id(),
            peer = %peer,
            verdict = admission.verdict(),
        );

        tokio::spawn(
            async move {
                let _guard = guard;
                // Outcome is already logged inside the worker.
                let _ = worker::handle_connection(stream, admission, &context).await;
            }
            .instrument(span),
        );
    }

    /// Close idle store connections, then wait for running workers.
    ///
    /// Workers are never cancelled here. When the drain timeout expires first,
    /// the report counts them as abandoned and they are dropped along with the
    /// runtime once the process exits. A zero `drain_timeout_secs` waits for
    /// every worker instead.
    async fn drain(self) -> ShutdownReport {
        let pool = self.context.auth.pool();
        let mut closed_connections = pool.shutdown().await;

        let abandoned_workers = self.tracker.wait_for_drain(self.drain_timeout).await;
        if abandoned_workers > 0 {
            tracing::warn!(
                remaining = abandoned_workers,
                "Drain timeout expired with workers still running"
            );
        }

        // Workers that finished during the drain returned their connections.
        closed_connections += pool.shutdown().await;
        let stats = pool.stats();
        tracing::info!(
            closed = closed_connections,
            opened_total = stats.opened,
            closed_total = stats.closed,
            "Store connections closed"
        );

        ShutdownReport {
            closed_connections,
            abandoned_workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListenerConfig;
    use crate::lifecycle::Shutdown;
    use crate::protocol::{FramedStream, Request, Response};
    use crate::store::MemoryStore;

    fn config(max_clients: usize) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.listener = ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            max_clients,
        };
        config.worker.slot_release_delay_ms = 0;
        config.worker.drain_timeout_secs = 5;
        config
    }

    #[tokio::test]
    async fn serves_then_drains_on_shutdown() {
        let config = config(2);
        let store = Arc::new(MemoryStore::new());
        let server = AuthServer::new(&config, Arc::clone(&store));
        let listener = Listener::bind(&config.listener).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let running = tokio::spawn(server.run(listener, shutdown.subscribe()));

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut channel = FramedStream::new(stream);
        channel
            .send(&Request::sign_in("nobody", "secret1").unwrap())
            .await
            .unwrap();
        let response: Response = channel.recv().await.unwrap();
        assert_eq!(response, Response::UserNotFound);

        shutdown.trigger();
        let report = running.await.unwrap();
        assert_eq!(report.abandoned_workers, 0);
        assert_eq!(store.opened(), store.closed());
    }

    async fn shutdown_while_slot_is_held(config: ServerConfig) -> (ShutdownReport, usize) {
        let store = Arc::new(MemoryStore::new());
        let server = AuthServer::new(&config, store);
        let admission = server.admission();
        let listener = Listener::bind(&config.listener).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let running = tokio::spawn(server.run(listener, shutdown.subscribe()));

        let mut channel = FramedStream::new(TcpStream::connect(addr).await.unwrap());
        channel
            .send(&Request::sign_in("nobody", "secret1").unwrap())
            .await
            .unwrap();
        let _: Response = channel.recv().await.unwrap();
        assert_eq!(admission.active_count(), 1);

        shutdown.trigger();
        let report = running.await.unwrap();
        (report, admission.active_count())
    }

    #[tokio::test]
    async fn zero_drain_timeout_waits_for_every_worker() {
        let mut config = config(1);
        config.worker.slot_release_delay_ms = 300;
        config.worker.drain_timeout_secs = 0;

        let (report, active) = shutdown_while_slot_is_held(config).await;
        assert_eq!(report.abandoned_workers, 0);
        assert_eq!(active, 0);
    }

    #[tokio::test]
    async fn expired_drain_reports_abandoned_workers() {
        let mut config = config(1);
        config.worker.slot_release_delay_ms = 5_000;
        config.worker.drain_timeout_secs = 1;

        let (report, active) = shutdown_while_slot_is_held(config).await;
        assert_eq!(report.abandoned_workers, 1);
        assert_eq!(active, 1);
    }
}
