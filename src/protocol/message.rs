//! Request and response messages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::validation;
use crate::auth::AuthResult;
use crate::store::User;

/// The single request a client sends on a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user")]
pub enum Request {
    SignIn(User),
    SignUp(User),
}

impl Request {
    /// Build a sign-in request after checking the field formats.
    pub fn sign_in(login: &str, password: &str) -> AuthResult<Self> {
        validation::validate_login(login)?;
        validation::validate_password(password)?;
        Ok(Request::SignIn(User::credentials(login, password)))
    }

    /// Build a sign-up request after checking the field formats.
    pub fn sign_up(user: User) -> AuthResult<Self> {
        validation::validate_login(&user.login)?;
        validation::validate_email(&user.email)?;
        validation::validate_password(&user.password)?;
        Ok(Request::SignUp(user))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Request::SignIn(_) => "sign_in",
            Request::SignUp(_) => "sign_up",
        }
    }

    pub fn user(&self) -> &User {
        match self {
            Request::SignIn(user) | Request::SignUp(user) => user,
        }
    }
}

/// The single response sent back for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "user")]
pub enum Response {
    Ok(User),
    UserNotFound,
    PasswordMismatch,
    UserExists,
    EmailExists,
    IncorrectUser,
    IncorrectPassword,
    IncorrectEmail,
    StoreUnavailable,
    TooManyClients,
}

impl Response {
    /// Stable tag name, used for logs and metrics labels.
    pub fn tag(&self) -> &'static str {
        match self {
            Response::Ok(_) => "Ok",
            Response::UserNotFound => "UserNotFound",
            Response::PasswordMismatch => "PasswordMismatch",
            Response::UserExists => "UserExists",
            Response::EmailExists => "EmailExists",
            Response::IncorrectUser => "IncorrectUser",
            Response::IncorrectPassword => "IncorrectPassword",
            Response::IncorrectEmail => "IncorrectEmail",
            Response::StoreUnavailable => "StoreUnavailable",
            Response::TooManyClients => "TooManyClients",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
