//! HTTP Basic credential checks.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AuthConfig;

static BASIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Basic\s+(\S+)$").expect("valid regex"));

/// Verifies a user name and password.
pub trait CredentialCheck: Send + Sync + std::fmt::Debug {
    fn verify(&self, user: &str, password: &str) -> bool;
}

/// Fixed user table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: BTreeMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.users.clone())
    }
}

impl CredentialCheck for StaticCredentials {
    fn verify(&self, user: &str, password: &str) -> bool {
        self.users
            .get(user)
            .is_some_and(|expected| expected == password)
    }
}

/// Split an `Authorization: Basic ...` value into user and password.
pub fn parse_basic(authorization: &str) -> Option<(String, String)> {
    let token = BASIC_RE.captures(authorization)?.get(1)?.as_str();
    let decoded = STANDARD.decode(token).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Whether the request's `Authorization` value passes `check`.
pub fn authenticate(check: &dyn CredentialCheck, authorization: Option<&str>) -> bool {
    authorization
        .and_then(parse_basic)
        .is_some_and(|(user, password)| check.verify(&user, &password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user_password: &str) -> String {
        format!("Basic {}", STANDARD.encode(user_password))
    }

    #[test]
    fn parses_basic_authorization() {
        assert_eq!(
            parse_basic(&basic("hansi:hansilein")),
            Some(("hansi".to_string(), "hansilein".to_string()))
        );
        assert_eq!(
            parse_basic(&basic("user:pass:with:colons")),
            Some(("user".to_string(), "pass:with:colons".to_string()))
        );
        assert_eq!(parse_basic(&basic("nocolon")), None);
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
    }

    #[test]
    fn static_credentials() {
        let mut users = BTreeMap::new();
        users.insert("hansi".to_string(), "hansilein".to_string());
        let check = StaticCredentials::new(users);

        assert!(authenticate(&check, Some(&basic("hansi:hansilein"))));
        assert!(!authenticate(&check, Some(&basic("hansi:wrong"))));
        assert!(!authenticate(&check, Some(&basic("other:hansilein"))));
        assert!(!authenticate(&check, None));
    }
}
