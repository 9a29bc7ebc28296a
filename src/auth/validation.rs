//! Field format checks applied when a client builds a request.
//!
//! The server does not re-run these; a request that reaches it is assumed to
//! be well-formed.

use crate::auth::{AuthError, AuthResult};

const MAX_LOGIN_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 254;

/// 1..=50 characters from `[A-Za-z0-9_]`.
pub fn validate_login(login: &str) -> AuthResult<()> {
    let valid = !login.is_empty()
        && login.len() <= MAX_LOGIN_LEN
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AuthError::IncorrectUser)
    }
}

/// 6..=50 alphanumeric characters.
pub fn validate_password(password: &str) -> AuthResult<()> {
    let len = password.chars().count();
    let valid = (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len)
        && password.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(AuthError::IncorrectPassword)
    }
}

/// `local@domain.tld`, no whitespace, one `@`, a dot inside the domain.
pub fn validate_email(email: &str) -> AuthResult<()> {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(AuthError::IncorrectEmail);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::IncorrectEmail);
    };
    let domain_ok = !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok {
        return Err(AuthError::IncorrectEmail);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logins() {
        assert!(validate_login("user_01").is_ok());
        assert!(validate_login("").is_err());
        assert!(validate_login("has space").is_err());
        assert!(validate_login(&"a".repeat(51)).is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("abc123").is_ok());
        assert!(validate_password("abc12").is_err());
        assert!(validate_password("abc 123").is_err());
        assert!(validate_password(&"a".repeat(51)).is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@mail.example.org").is_ok());
        assert!(validate_email("a.x.com").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@x").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a@x.com.").is_err());
        assert!(validate_email("a@b@x.com").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }
}
