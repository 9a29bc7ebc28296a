//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Logging → Metrics → Bind listener → Open store → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain idle pool → Wait for workers → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and exits nonzero
//! - Listener binds before the store is touched, so a taken port fails immediately
//! - Shutdown has a deadline for in-flight workers

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
