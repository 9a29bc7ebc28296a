//! In-process store.
//!
//! Mirrors the relational backend closely enough to run the whole server
//! without a database: unique `login`/`email`, sequential ids, a login history
//! and connection open/close accounting.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::store::{Connector, StoreError, StoreResult, UniqueField, User, UserStore};

/// Handle returned by [`MemoryStore::connect`].
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryConnection {
    id: u64,
}

impl MemoryConnection {
    /// Sequence number assigned when the connection was opened.
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    login_history: Vec<String>,
    next_user_id: i32,
}

/// Store backed by in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    opened: AtomicU64,
    closed: AtomicU64,
    inserts: AtomicU64,
    unavailable: AtomicBool,
    broken: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_connection(&self, conn: &MemoryConnection) -> StoreResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionLost(format!(
                "memory connection {} reset",
                conn.id
            )));
        }
        Ok(())
    }

    /// Insert a row directly, bypassing sign-up rules.
    pub fn seed(&self, mut user: User) -> i32 {
        let mut tables = self.tables();
        tables.next_user_id += 1;
        let id = tables.next_user_id;
        user.id = Some(id);
        tables.users.push(user);
        id
    }

    /// When set, `connect` fails with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// When set, every query fails with `StoreError::ConnectionLost`.
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }

    /// Number of successful `insert` calls.
    pub fn insert_count(&self) -> u64 {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of login-history entries recorded for `login`.
    pub fn login_events(&self, login: &str) -> usize {
        self.tables()
            .login_history
            .iter()
            .filter(|entry| entry.as_str() == login)
            .count()
    }

    /// Connections opened so far.
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    /// Connections closed so far.
    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryStore {
    type Connection = MemoryConnection;

    async fn connect(&self) -> StoreResult<MemoryConnection> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(connection = id, "Memory connection opened");
        Ok(MemoryConnection { id })
    }

    async fn close(&self, conn: MemoryConnection) -> StoreResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(connection = conn.id, "Memory connection closed");
        Ok(())
    }
}

impl UserStore for MemoryStore {
    async fn find_by_login(
        &self,
        conn: &mut MemoryConnection,
        login: &str,
    ) -> StoreResult<Option<User>> {
        self.check_connection(conn)?;
        Ok(self.tables().users.iter().find(|u| u.login == login).cloned())
    }

    async fn find_by_email(
        &self,
        conn: &mut MemoryConnection,
        email: &str,
    ) -> StoreResult<Option<User>> {
        self.check_connection(conn)?;
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, conn: &mut MemoryConnection, user: &User) -> StoreResult<i32> {
        self.check_connection(conn)?;
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.login == user.login) {
            return Err(StoreError::Conflict(UniqueField::Login));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        tables.next_user_id += 1;
        let id = tables.next_user_id;
        let mut row = user.clone();
        row.id = Some(id);
        tables.users.push(row);
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn record_login_event(&self, conn: &mut MemoryConnection, login: &str) -> StoreResult<()> {
        self.check_connection(conn)?;
        self.tables().login_history.push(login.to_string());
        Ok(())
    }
}
