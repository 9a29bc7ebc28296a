//! User identity record shared by the store, the auth service and the wire protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Enabled,
    Disabled,
}

/// Account privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserPrivilege {
    #[default]
    User,
    Admin,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Enabled => "ENABLED",
            UserStatus::Disabled => "DISABLED",
        }
    }
}

impl UserPrivilege {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserPrivilege::User => "USER",
            UserPrivilege::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UserPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored enum column holds an unknown value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {column} value: {value}")]
pub struct UnknownColumnValue {
    pub column: &'static str,
    pub value: String,
}

impl FromStr for UserStatus {
    type Err = UnknownColumnValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ENABLED" => Ok(UserStatus::Enabled),
            "DISABLED" => Ok(UserStatus::Disabled),
            _ => Err(UnknownColumnValue {
                column: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for UserPrivilege {
    type Err = UnknownColumnValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(UserPrivilege::User),
            "ADMIN" => Ok(UserPrivilege::Admin),
            _ => Err(UnknownColumnValue {
                column: "privilege",
                value: s.to_string(),
            }),
        }
    }
}

/// A user row.
///
/// `login` and `email` are unique across the store. The password is kept
/// exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Store-assigned identifier, `None` until the row is inserted.
    pub id: Option<i32>,
    pub login: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub status: UserStatus,
    pub privilege: UserPrivilege,
    pub last_password_change: DateTime<Utc>,
}

impl User {
    /// Credentials-only user, as carried by a sign-in request.
    pub fn credentials(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Full profile for a new account, stamped with the current time.
    pub fn new_account(
        login: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            login: login.into(),
            email: email.into(),
            full_name: full_name.into(),
            password: password.into(),
            status: UserStatus::Enabled,
            privilege: UserPrivilege::User,
            last_password_change: Utc::now(),
        }
    }
}
