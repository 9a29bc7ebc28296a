//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → admission.rs (admitted / refused verdict, slot accounting)
//!     → connection.rs (connection ID, in-flight tracking)
//!     → Hand off to a worker task
//!
//! Worker States:
//!     Start → Decoded → Processed → Responded → Closed
//! ```
//!
//! # Design Decisions
//! - Over-limit clients are answered, never silently dropped
//! - Each connection tracked for graceful shutdown

pub mod admission;
pub mod connection;
pub mod listener;

pub use admission::{Admission, AdmissionController, AdmissionSlot};
pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker, WorkerState};
pub use listener::{Listener, ListenerError};
