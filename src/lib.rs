//! Admission-controlled TCP sign-in / sign-up server.
//!
//! Each connection carries one request and gets one response. A bounded number
//! of clients is processed at a time; the rest are answered `TooManyClients`.
//! Store connections are reused through a LIFO pool.

pub mod auth;
pub mod client;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pool;
pub mod protocol;
pub mod server;
pub mod store;

pub use client::AuthClient;
pub use config::ServerConfig;
pub use lifecycle::Shutdown;
pub use protocol::{Request, Response};
pub use server::AuthServer;
