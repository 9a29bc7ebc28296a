//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Worker (admitted request)
//!     → service.rs
//!         - acquire one pooled connection
//!         - sign_in: find_by_login → password check → record_login_event
//!         - sign_up: find_by_login + find_by_email → insert → record_login_event
//!         - release (or discard if the connection broke)
//!     → AuthResult<User> back to the worker
//! ```
//!
//! # Design Decisions
//! - Outcomes are `Result<User, AuthError>`; the worker maps them to response tags
//! - Passwords are compared as stored, no hashing
//! - validation.rs runs on the client side when requests are built

pub mod error;
pub mod service;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use service::AuthService;
