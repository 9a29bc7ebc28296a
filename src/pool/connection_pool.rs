//! LIFO pool of store connections.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;
use crate::store::{Connector, StoreResult};

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections sitting in the idle stack.
    pub idle: usize,
    /// Connections ever opened through the connector.
    pub opened: u64,
    /// Connections ever closed through the connector.
    pub closed: u64,
}

/// Pool of reusable store connections.
///
/// Shared via `Arc` between the auth service and the server's shutdown path.
pub struct ConnectionPool<C: Connector> {
    connector: Arc<C>,
    idle: Mutex<Vec<C::Connection>>,
    opened: AtomicU64,
    closed: AtomicU64,
}

impl<C: Connector> ConnectionPool<C> {
    /// Create an empty pool. Nothing is opened until the first acquire.
    pub fn new(connector: Arc<C>) -> Self {
        Self {
            connector,
            idle: Mutex::new(Vec::new()),
            opened: AtomicU64::new(0),
            closed: AtomicU64::new(0),
        }
    }

    fn idle(&self) -> MutexGuard<'_, Vec<C::Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrow a connection, reusing the most recently released one if any.
    ///
    /// Fails with `StoreError::Unavailable` when a new connection cannot be opened.
    pub async fn acquire(self: &Arc<Self>) -> StoreResult<PooledConnection<C>> {
        let reused = self.idle().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => {
                let conn = self.connector.connect().await.inspect_err(|e| {
                    tracing::error!(error = %e, "Failed to open store connection");
                })?;
                let opened = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
                metrics::record_pool_open();
                tracing::debug!(opened, "Opened new pooled connection");
                conn
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
        })
    }

    /// Push a connection back onto the idle stack. No health check.
    fn release(&self, conn: C::Connection) {
        let idle = {
            let mut idle = self.idle();
            idle.push(conn);
            idle.len()
        };
        metrics::set_pool_idle(idle);
        tracing::trace!(idle, "Connection returned to pool");
    }

    async fn close(&self, conn: C::Connection) {
        if let Err(e) = self.connector.close(conn).await {
            tracing::warn!(error = %e, "Error while closing store connection");
        }
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    /// Close every idle connection and return how many were closed.
    ///
    /// Borrowed connections are left alone; they come back to the (now empty)
    /// idle stack when their borrowers finish.
    pub async fn shutdown(&self) -> usize {
        let drained = std::mem::take(&mut *self.idle());
        let count = drained.len();
        for conn in drained {
            self.close(conn).await;
        }
        metrics::set_pool_idle(0);
        tracing::info!(closed = count, "Connection pool drained");
        count
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.idle().len(),
            opened: self.opened.load(Ordering::SeqCst),
            closed: self.closed.load(Ordering::SeqCst),
        }
    }
}

impl<C: Connector> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Exclusive borrow of a pooled connection.
///
/// Dropping the guard returns the connection to the pool.
pub struct PooledConnection<C: Connector> {
    conn: Option<C::Connection>,
    pool: Arc<ConnectionPool<C>>,
}

impl<C: Connector> fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("held", &self.conn.is_some())
            .finish()
    }
}

impl<C: Connector> PooledConnection<C> {
    /// Close the connection instead of returning it. Used once it is known broken.
    pub async fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("Discarding broken store connection");
            self.pool.close(conn).await;
        }
    }
}

impl<C: Connector> Deref for PooledConnection<C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl<C: Connector> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<C: Connector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use std::collections::HashSet;

    fn pool() -> (Arc<MemoryStore>, Arc<ConnectionPool<MemoryStore>>) {
        let store = Arc::new(MemoryStore::new());
        let pool = Arc::new(ConnectionPool::new(Arc::clone(&store)));
        (store, pool)
    }

    #[tokio::test]
    async fn empty_pool_opens_exactly_one_connection() {
        let (store, pool) = pool();

        let conn = pool.acquire().await.unwrap();
        assert_eq!(store.opened(), 1);
        assert_eq!(pool.stats().idle, 0);

        drop(conn);
        assert_eq!(pool.stats().idle, 1);
    }

    #[tokio::test]
    async fn released_connection_is_reused() {
        let (store, pool) = pool();

        let first = pool.acquire().await.unwrap();
        let first_id = first.id();
        drop(first);

        let second = pool.acquire().await.unwrap();
        assert_eq!(second.id(), first_id);
        assert_eq!(store.opened(), 1);
    }

    #[tokio::test]
    async fn reuse_is_last_in_first_out() {
        let (_store, pool) = pool();

        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        let (a_id, b_id) = (a.id(), b.id());
        drop(a);
        drop(b);

        assert_eq!(pool.acquire().await.unwrap().id(), b_id);
        // the previous guard went back on top, so b comes out again
        let again = pool.acquire().await.unwrap();
        let next = pool.acquire().await.unwrap();
        assert_eq!(again.id(), b_id);
        assert_eq!(next.id(), a_id);
    }

    #[tokio::test]
    async fn held_connections_are_never_shared() {
        let (_store, pool) = pool();
        let mut held = Vec::new();
        let mut ids = HashSet::new();

        for round in 0..20 {
            if round % 3 == 2 {
                held.remove(0);
            }
            let conn = pool.acquire().await.unwrap();
            held.push(conn);

            ids.clear();
            for conn in &held {
                assert!(ids.insert(conn.id()), "connection {} handed out twice", conn.id());
            }
        }
    }

    #[tokio::test]
    async fn concurrent_borrowers_get_distinct_connections() {
        let (store, pool) = pool();
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            tasks.push(tokio::spawn(async move {
                let conn = pool.acquire().await.unwrap();
                let id = conn.id();
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                id
            }));
        }

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }
        assert_eq!(ids.len(), 8);
        assert_eq!(store.opened(), 8);
        assert_eq!(pool.stats().idle, 8);
    }

    #[tokio::test]
    async fn shutdown_closes_every_idle_connection() {
        let (store, pool) = pool();

        let held: Vec<_> = vec![
            pool.acquire().await.unwrap(),
            pool.acquire().await.unwrap(),
            pool.acquire().await.unwrap(),
        ];
        drop(held);
        assert_eq!(pool.stats().idle, 3);

        assert_eq!(pool.shutdown().await, 3);
        assert_eq!(store.closed(), 3);
        assert_eq!(store.closed(), store.opened());
        assert_eq!(
            pool.stats(),
            PoolStats {
                idle: 0,
                opened: 3,
                closed: 3
            }
        );

        // a late acquire opens a fresh connection
        let late = pool.acquire().await.unwrap();
        assert_eq!(late.id(), 4);
    }

    #[tokio::test]
    async fn shutdown_leaves_borrowed_connections_alone() {
        let (store, pool) = pool();
        let borrowed = pool.acquire().await.unwrap();
        drop(pool.acquire().await.unwrap());

        assert_eq!(pool.shutdown().await, 1);
        assert_eq!(store.closed(), 1);

        drop(borrowed);
        assert_eq!(pool.stats().idle, 1);
        assert_eq!(pool.shutdown().await, 1);
        assert_eq!(store.closed(), store.opened());
    }

    #[tokio::test]
    async fn discarded_connection_is_closed_not_returned() {
        let (store, pool) = pool();
        let conn = pool.acquire().await.unwrap();
        conn.discard().await;

        assert_eq!(pool.stats().idle, 0);
        assert_eq!(store.closed(), 1);
    }

    #[tokio::test]
    async fn connect_failure_is_unavailable() {
        let (store, pool) = pool();
        store.set_unavailable(true);

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(pool.stats().opened, 0);
    }

    #[tokio::test]
    async fn borrowed_connection_debug_output() {
        let (_store, pool) = pool();
        let conn = pool.acquire().await.unwrap();
        assert_eq!(format!("{conn:?}"), "PooledConnection { held: true }");
    }
}
