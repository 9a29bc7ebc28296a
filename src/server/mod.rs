//! Auth server core.
//!
//! # Data Flow
//! ```text
//! Listener::accept
//!     → AdmissionController::admit (Admitted / Refused verdict)
//!     → ConnectionTracker::track (connection id, drain accounting)
//!     → tokio::spawn(worker::handle_connection)
//!         → FramedStream::recv (one Request)
//!         → AuthService (admitted only, via the store pool)
//!         → FramedStream::send (one Response)
//!         → slot released after the configured delay
//! ```
//!
//! # Design Decisions
//! - One task per connection, one request per connection
//! - The accept loop never waits on a worker
//! - Shutdown stops accepting first, then drains workers and the pool

pub mod auth_server;
pub mod worker;

pub use auth_server::{AuthServer, ShutdownReport};
pub use worker::{handle_connection, response_for, WorkerContext};
