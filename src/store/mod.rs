//! Store collaborator subsystem.
//!
//! # Data Flow
//! ```text
//! pool (acquire)
//!     → Connector::connect (open a store connection)
//!     → UserStore queries on the borrowed connection
//!         - find_by_login / find_by_email
//!         - insert
//!         - record_login_event
//! pool (shutdown)
//!     → Connector::close for every idle connection
//! ```
//!
//! # Backends
//! - postgres.rs: `sqlx::PgConnection` against the `users` schema in `sql/schema.sql`
//! - memory.rs: in-process tables with the same uniqueness rules
//!
//! # Design Decisions
//! - Every query takes the borrowed connection explicitly; stores hold no connections
//! - Lookups are exact equality matches returning the first row
//! - Insert enforces uniqueness at the store and reports it as `StoreError::Conflict`

pub mod error;
pub mod memory;
pub mod postgres;
pub mod user;

pub use error::{StoreError, StoreResult, UniqueField};
pub use memory::{MemoryConnection, MemoryStore};
pub use postgres::PgStore;
pub use user::{User, UserPrivilege, UserStatus};

/// Opens and closes store connections on behalf of the pool.
#[trait_variant::make(Connector: Send)]
pub trait LocalConnector: Sync + 'static {
    type Connection: Send + 'static;

    /// Open a fresh connection.
    async fn connect(&self) -> StoreResult<Self::Connection>;

    /// Close a connection for good.
    async fn close(&self, conn: Self::Connection) -> StoreResult<()>;
}

/// User queries executed on a borrowed connection.
#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore: Connector {
    /// First user whose login equals `login`.
    async fn find_by_login(
        &self,
        conn: &mut Self::Connection,
        login: &str,
    ) -> StoreResult<Option<User>>;

    /// First user whose email equals `email`.
    async fn find_by_email(
        &self,
        conn: &mut Self::Connection,
        email: &str,
    ) -> StoreResult<Option<User>>;

    /// Insert a new row and return the store-assigned id.
    async fn insert(&self, conn: &mut Self::Connection, user: &User) -> StoreResult<i32>;

    /// Append a login-history entry for `login`.
    async fn record_login_event(&self, conn: &mut Self::Connection, login: &str)
        -> StoreResult<()>;
}
