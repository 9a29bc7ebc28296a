//! Connection identity, worker states and in-flight tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Name the worker protocol states (Start → Decoded → Processed → Responded → Closed)
//! - Track in-flight workers so shutdown can wait for them

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Worker protocol state for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Channel opened, nothing read yet.
    Start,
    /// One request read and decoded.
    Decoded,
    /// Response chosen (auth result or refusal).
    Processed,
    /// Response written to the client.
    Responded,
    /// Socket shut down.
    Closed,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Start => "start",
            WorkerState::Decoded => "decoded",
            WorkerState::Processed => "processed",
            WorkerState::Responded => "responded",
            WorkerState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Tracks in-flight workers, admitted or refused, for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new worker. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every tracked worker has finished, or `timeout` elapses.
    /// With no timeout, wait as long as it takes.
    ///
    /// Returns the number of workers still running.
    pub async fn wait_for_drain(&self, timeout: Option<Duration>) -> u64 {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        loop {
            let remaining = self.active_count();
            let expired = deadline.is_some_and(|d| tokio::time::Instant::now() >= d);
            if remaining == 0 || expired {
                return remaining;
            }
            // Check periodically
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Guard that tracks a worker's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
