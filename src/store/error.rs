//! Store error type.

use std::fmt;
use thiserror::Error;

use crate::store::user::UnknownColumnValue;

pub type StoreResult<T> = Result<T, StoreError>;

/// Unique column a conflicting insert collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Login,
    Email,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Login => f.write_str("login"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A new connection could not be opened.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The connection broke mid-call and must not be reused.
    #[error("store connection lost: {0}")]
    ConnectionLost(String),

    /// Insert rejected by a uniqueness constraint.
    #[error("duplicate {0}")]
    Conflict(UniqueField),

    /// A row could not be mapped to a `User`.
    #[error("invalid row: {0}")]
    InvalidRow(#[from] UnknownColumnValue),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the connection that produced this error has to be discarded.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            StoreError::ConnectionLost(_) => true,
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::Protocol(_) | sqlx::Error::Tls(_)
            ),
            _ => false,
        }
    }
}
