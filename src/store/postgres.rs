//! PostgreSQL store over single `sqlx` connections.
//!
//! Schema and the `last_ten_sign_in` procedure live in `sql/schema.sql`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use crate::config::StoreConfig;
use crate::store::{Connector, StoreError, StoreResult, UniqueField, User, UserStore};

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Opens `PgConnection`s and runs the user queries on them.
#[derive(Debug, Clone)]
pub struct PgStore {
    options: PgConnectOptions,
}

impl PgStore {
    /// Build connection options from the `[store]` section.
    ///
    /// `user` and `password` override whatever the URL carries when non-empty.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let mut options = PgConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Unavailable(format!("invalid store url: {}", e)))?;
        if !config.user.is_empty() {
            options = options.username(&config.user);
        }
        if !config.password.is_empty() {
            options = options.password(&config.password);
        }
        Ok(Self { options })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    login: String,
    email: String,
    full_name: String,
    password: String,
    status: String,
    privilege: String,
    last_password_change: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> StoreResult<User> {
        Ok(User {
            id: Some(self.id),
            login: self.login,
            email: self.email,
            full_name: self.full_name,
            password: self.password,
            status: self.status.parse()?,
            privilege: self.privilege.parse()?,
            last_password_change: self.last_password_change,
        })
    }
}

/// Sort a driver error into the store taxonomy.
fn classify(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            match db.constraint() {
                Some(c) if c.contains("login") => return StoreError::Conflict(UniqueField::Login),
                Some(c) if c.contains("email") => return StoreError::Conflict(UniqueField::Email),
                _ => {}
            }
        }
    }
    StoreError::Database(error)
}

const SELECT_BY_LOGIN: &str = r#"
    SELECT id, login, email, full_name, password, status, privilege, last_password_change
    FROM users
    WHERE login = $1
    LIMIT 1
"#;

const SELECT_BY_EMAIL: &str = r#"
    SELECT id, login, email, full_name, password, status, privilege, last_password_change
    FROM users
    WHERE email = $1
    LIMIT 1
"#;

impl Connector for PgStore {
    type Connection = PgConnection;

    async fn connect(&self) -> StoreResult<PgConnection> {
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::debug!(
            host = %self.options.get_host(),
            database = ?self.options.get_database(),
            "Opened store connection"
        );
        Ok(conn)
    }

    async fn close(&self, conn: PgConnection) -> StoreResult<()> {
        conn.close().await.map_err(classify)
    }
}

impl UserStore for PgStore {
    async fn find_by_login(
        &self,
        conn: &mut PgConnection,
        login: &str,
    ) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_BY_LOGIN)
            .bind(login)
            .fetch_optional(&mut *conn)
            .await
            .map_err(classify)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(
        &self,
        conn: &mut PgConnection,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_BY_EMAIL)
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
            .map_err(classify)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn insert(&self, conn: &mut PgConnection, user: &User) -> StoreResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (
                login,
                email,
                full_name,
                status,
                privilege,
                password,
                last_password_change
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&user.login)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.status.as_str())
        .bind(user.privilege.as_str())
        .bind(&user.password)
        .bind(user.last_password_change)
        .fetch_one(&mut *conn)
        .await
        .map_err(classify)?;

        Ok(id)
    }

    async fn record_login_event(&self, conn: &mut PgConnection, login: &str) -> StoreResult<()> {
        sqlx::query("CALL last_ten_sign_in($1)")
            .bind(login)
            .execute(&mut *conn)
            .await
            .map_err(classify)?;

        Ok(())
    }
}
