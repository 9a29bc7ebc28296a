//! Admission control for concurrently served clients.
//!
//! # Responsibilities
//! - Keep a live count of admitted, unfinished workers
//! - Stamp each accepted connection `Admitted` or `Refused`
//! - Release a slot exactly once when an admitted worker finishes
//!
//! # Design Decisions
//! - Refusal is a verdict, not backpressure: the connection is still served a
//!   `TooManyClients` response instead of waiting for a free slot
//! - Compare-and-swap increment so the count never passes the limit, even transiently
//! - A refused connection never touches the counter

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

/// Verdict stamped on a connection at accept time.
#[derive(Debug)]
pub enum Admission {
    /// Within capacity; holds the slot until the worker is done.
    Admitted(AdmissionSlot),
    /// Over capacity; the worker answers `TooManyClients`.
    Refused,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            Admission::Admitted(_) => "admitted",
            Admission::Refused => "refused",
        }
    }
}

/// Bounds the number of concurrently processed clients.
#[derive(Debug)]
pub struct AdmissionController {
    active: Arc<AtomicUsize>,
    max_clients: usize,
}

impl AdmissionController {
    pub fn new(max_clients: usize) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max_clients,
        }
    }

    /// Decide whether a freshly accepted connection may be processed.
    pub fn admit(&self) -> Admission {
        let mut current = self.active.load(Ordering::SeqCst);
        loop {
            if current >= self.max_clients {
                metrics::record_admission("refused");
                tracing::info!(
                    active = current,
                    max_clients = self.max_clients,
                    "Client refused: connection limit reached"
                );
                return Admission::Refused;
            }
            match self.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        metrics::record_admission("admitted");
        metrics::set_active_clients(current + 1);
        tracing::debug!(active = current + 1, "Client admitted");

        Admission::Admitted(AdmissionSlot {
            active: Arc::clone(&self.active),
        })
    }

    /// Number of outstanding slots.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}

/// Permission to process one client.
///
/// The slot is released when the value is dropped, so it is released exactly
/// once whatever path the worker takes.
#[derive(Debug)]
pub struct AdmissionSlot {
    active: Arc<AtomicUsize>,
}

impl AdmissionSlot {
    /// Free the slot now.
    pub fn release(self) {
        drop(self);
    }

    /// Free the slot after `delay`, throttling how fast it can be reused.
    pub async fn release_after(self, delay: Duration) {
        if !delay.is_zero() {
            tracing::trace!(delay_ms = delay.as_millis() as u64, "Holding slot before release");
            tokio::time::sleep(delay).await;
        }
        self.release();
    }
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_clients(remaining);
        tracing::debug!(active = remaining, "Admission slot released");
    }
}
