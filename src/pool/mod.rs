//! Store connection pool.
//!
//! # Data Flow
//! ```text
//! AuthService call
//!     → ConnectionPool::acquire
//!         - pop the most recently released idle connection (LIFO), or
//!         - Connector::connect a new one
//!     → PooledConnection (exclusive, derefs to the store connection)
//!     → dropped: pushed back onto the idle stack
//!       discarded: closed through the Connector
//!
//! Process shutdown:
//!     → ConnectionPool::shutdown closes every idle connection
//! ```
//!
//! # Design Decisions
//! - One mutex around the idle stack; critical sections are push/pop only
//! - Connecting and closing happen outside the lock
//! - No upper bound and no health check; growth is capped by admission control
//! - Release is tied to the guard's drop so every exit path returns the connection

pub mod connection_pool;

pub use connection_pool::{ConnectionPool, PoolStats, PooledConnection};
