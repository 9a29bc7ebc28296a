//! Auth error kinds.

use thiserror::Error;

use crate::store::{StoreError, UniqueField};

pub type AuthResult<T> = Result<T, AuthError>;

/// Every way a sign-in or sign-up can fail.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("Malformed login")]
    IncorrectUser,

    /// Password length or characters out of range.
    #[error("Malformed password")]
    IncorrectPassword,

    /// Email is not of the form `local@domain.tld`.
    #[error("Malformed email")]
    IncorrectEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Login already registered")]
    UserExists,

    #[error("Email already registered")]
    EmailExists,

    /// Any store-level failure, including failing to get a connection.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(UniqueField::Login) => AuthError::UserExists,
            StoreError::Conflict(UniqueField::Email) => AuthError::EmailExists,
            other => AuthError::StoreUnavailable(other),
        }
    }
}

impl AuthError {
    /// Whether the pooled connection used for the call must be discarded.
    pub fn connection_lost(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(e) if e.is_connection_lost())
    }
}
