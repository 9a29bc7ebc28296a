//! Sign-in and sign-up business rules.

use std::sync::Arc;

use crate::auth::{AuthError, AuthResult};
use crate::pool::{ConnectionPool, PooledConnection};
use crate::store::{User, UserStore};

/// Runs auth operations, one pooled connection per call.
pub struct AuthService<S: UserStore> {
    store: Arc<S>,
    pool: Arc<ConnectionPool<S>>,
}

impl<S: UserStore> AuthService<S> {
    /// Build a service whose pool opens connections through `store`.
    pub fn new(store: Arc<S>, pool: Arc<ConnectionPool<S>>) -> Self {
        Self { store, pool }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool<S>> {
        &self.pool
    }

    /// Authenticate `candidate` by login and password.
    ///
    /// Returns the stored user and records a login event on success. A wrong
    /// password records nothing.
    pub async fn sign_in(&self, candidate: &User) -> AuthResult<User> {
        tracing::debug!(login = %candidate.login, "Sign in started");
        let mut conn = self.pool.acquire().await?;
        let outcome = self.sign_in_on(&mut *conn, candidate).await;
        self.settle(conn, outcome).await
    }

    /// Register `candidate` if neither its login nor its email is taken.
    ///
    /// The existence checks and the insert are separate store calls. Two
    /// concurrent sign-ups can both pass the checks; the loser then hits the
    /// store's unique constraint, which is reported as the matching conflict.
    pub async fn sign_up(&self, candidate: &User) -> AuthResult<User> {
        tracing::debug!(login = %candidate.login, "Sign up started");
        let mut conn = self.pool.acquire().await?;
        let outcome = self.sign_up_on(&mut *conn, candidate).await;
        self.settle(conn, outcome).await
    }

    async fn sign_in_on(&self, conn: &mut S::Connection, candidate: &User) -> AuthResult<User> {
        let stored = self
            .store
            .find_by_login(conn, &candidate.login)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if stored.password != candidate.password {
            return Err(AuthError::PasswordMismatch);
        }

        self.store.record_login_event(conn, &stored.login).await?;
        tracing::info!(login = %stored.login, "User signed in");
        Ok(stored)
    }

    async fn sign_up_on(&self, conn: &mut S::Connection, candidate: &User) -> AuthResult<User> {
        let by_login = self.store.find_by_login(conn, &candidate.login).await?;
        let by_email = self.store.find_by_email(conn, &candidate.email).await?;

        if by_login.is_some() {
            return Err(AuthError::UserExists);
        }
        if by_email.is_some() {
            return Err(AuthError::EmailExists);
        }

        let id = self.store.insert(conn, candidate).await?;
        self.store.record_login_event(conn, &candidate.login).await?;

        tracing::info!(login = %candidate.login, id, "User signed up");
        Ok(User {
            id: Some(id),
            ..candidate.clone()
        })
    }

    /// Hand the connection back, or close it if the call broke it.
    async fn settle<T>(&self, conn: PooledConnection<S>, outcome: AuthResult<T>) -> AuthResult<T> {
        match &outcome {
            Err(e) if e.connection_lost() => conn.discard().await,
            _ => drop(conn),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Connector, MemoryConnection, MemoryStore, StoreResult, UserStore};

    /// Lookups that never see existing rows, as when a concurrent sign-up
    /// commits between the existence checks and the insert.
    struct StaleLookups(MemoryStore);

    impl Connector for StaleLookups {
        type Connection = MemoryConnection;

        async fn connect(&self) -> StoreResult<MemoryConnection> {
            self.0.connect().await
        }

        async fn close(&self, conn: MemoryConnection) -> StoreResult<()> {
            self.0.close(conn).await
        }
    }

    impl UserStore for StaleLookups {
        async fn find_by_login(
            &self,
            _conn: &mut MemoryConnection,
            _login: &str,
        ) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_email(
            &self,
            _conn: &mut MemoryConnection,
            _email: &str,
        ) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn insert(&self, conn: &mut MemoryConnection, user: &User) -> StoreResult<i32> {
            self.0.insert(conn, user).await
        }

        async fn record_login_event(
            &self,
            conn: &mut MemoryConnection,
            login: &str,
        ) -> StoreResult<()> {
            self.0.record_login_event(conn, login).await
        }
    }

    fn service() -> (Arc<MemoryStore>, AuthService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let pool = Arc::new(ConnectionPool::new(Arc::clone(&store)));
        (Arc::clone(&store), AuthService::new(store, pool))
    }

    fn alice() -> User {
        User::new_account("alice", "alice@x.com", "Alice Liddell", "secret1")
    }

    #[tokio::test]
    async fn sign_in_returns_stored_user_and_records_login() {
        let (store, auth) = service();
        store.seed(alice());

        let user = auth.sign_in(&User::credentials("alice", "secret1")).await.unwrap();
        assert_eq!(user.id, Some(1));
        assert_eq!(user.email, "alice@x.com");
        assert_eq!(store.login_events("alice"), 1);
    }

    #[tokio::test]
    async fn sign_in_unknown_login_is_user_not_found() {
        let (_store, auth) = service();
        let err = auth.sign_in(&User::credentials("u1", "secret1")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn sign_in_wrong_password_records_nothing() {
        let (store, auth) = service();
        store.seed(alice());

        let err = auth.sign_in(&User::credentials("alice", "wrong99")).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        assert_eq!(store.login_events("alice"), 0);
    }

    #[tokio::test]
    async fn sign_up_then_duplicate_login() {
        let (store, auth) = service();

        let created = auth
            .sign_up(&User::new_account("a", "a@x.com", "", "p"))
            .await
            .unwrap();
        assert_eq!(created.id, Some(1));
        assert_eq!(store.login_events("a"), 1);

        let err = auth
            .sign_up(&User::new_account("a", "other@x.com", "", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn sign_up_duplicate_email_issues_no_insert() {
        let (store, auth) = service();
        store.seed(alice());

        let err = auth
            .sign_up(&User::new_account("bob", "alice@x.com", "Bob", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));
        assert_eq!(store.insert_count(), 0);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn login_conflict_wins_over_email_conflict() {
        let (store, auth) = service();
        store.seed(alice());

        let err = auth.sign_up(&alice()).await.unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
    }

    #[tokio::test]
    async fn sign_up_losing_the_insert_race_reports_the_conflict() {
        let inner = MemoryStore::new();
        inner.seed(alice());
        let store = Arc::new(StaleLookups(inner));
        let pool = Arc::new(ConnectionPool::new(Arc::clone(&store)));
        let auth = AuthService::new(Arc::clone(&store), pool);

        let same_login = User::new_account("alice", "other@x.com", "Other", "secret1");
        let err = auth.sign_up(&same_login).await.unwrap_err();
        assert!(matches!(err, AuthError::UserExists));

        let same_email = User::new_account("bob", "alice@x.com", "Bob", "secret1");
        let err = auth.sign_up(&same_email).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));

        // A conflict is not a broken connection; it goes back to the pool.
        assert_eq!(auth.pool().stats().idle, 1);
        assert_eq!(store.0.user_count(), 1);
        assert_eq!(store.0.login_events("alice"), 0);
    }

    #[tokio::test]
    async fn connection_is_returned_on_every_path() {
        let (store, auth) = service();
        store.seed(alice());

        let _ = auth.sign_in(&User::credentials("alice", "secret1")).await;
        let _ = auth.sign_in(&User::credentials("alice", "nope000")).await;
        let _ = auth.sign_in(&User::credentials("ghost", "secret1")).await;
        let _ = auth.sign_up(&alice()).await;

        assert_eq!(store.opened(), 1);
        assert_eq!(auth.pool().stats().idle, 1);
    }

    #[tokio::test]
    async fn unreachable_store_is_store_unavailable() {
        let (store, auth) = service();
        store.set_unavailable(true);

        let err = auth.sign_in(&User::credentials("alice", "secret1")).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
        let err = auth.sign_up(&alice()).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn broken_connection_is_discarded() {
        let (store, auth) = service();
        store.seed(alice());
        store.set_broken(true);

        let err = auth.sign_in(&User::credentials("alice", "secret1")).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
        assert_eq!(auth.pool().stats().idle, 0);
        assert_eq!(store.closed(), 1);

        store.set_broken(false);
        auth.sign_in(&User::credentials("alice", "secret1")).await.unwrap();
        assert_eq!(store.opened(), 2);
    }
}
