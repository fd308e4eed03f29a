//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, payload size fits the wire format)
//! - Check that upstream URLs and socket addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TranslationConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::TranslationConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} = {value} exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("{field} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must use scheme {expected}, got {value}")]
    WrongScheme {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{field} is not a socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &TranslationConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.is_empty() {
        errors.push(ValidationError::Empty {
            field: "listener.address",
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_connections",
        });
    }

    let max_payload = config.protocol.max_payload_size;
    if max_payload == 0 {
        errors.push(ValidationError::Zero {
            field: "protocol.max_payload_size",
        });
    } else if max_payload > u16::MAX as usize {
        errors.push(ValidationError::TooLarge {
            field: "protocol.max_payload_size",
            value: max_payload,
            max: u16::MAX as usize,
        });
    }

    check_url(
        &mut errors,
        "upstream.http_base",
        &config.upstream.http_base,
        &["http", "https"],
    );
    check_url(&mut errors, "upstream.ajp_base", &config.upstream.ajp_base, &["ajp"]);
    check_url(
        &mut errors,
        "upstream.bounce",
        &config.upstream.bounce,
        &["http", "https"],
    );

    if config.upstream.pool.is_empty() {
        errors.push(ValidationError::Empty {
            field: "upstream.pool",
        });
    }

    if config.auth.realm.is_empty() {
        errors.push(ValidationError::Empty { field: "auth.realm" });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    schemes: &[&'static str],
) {
    match url::Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(_) => errors.push(ValidationError::WrongScheme {
            field,
            value: value.to_string(),
            expected: schemes[0],
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&TranslationConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = TranslationConfig::default();
        config.listener.max_connections = 0;
        config.protocol.max_payload_size = 100_000;
        config.upstream.http_base = "not a url".to_string();
        config.upstream.ajp_base = "http://wrong-scheme/".to_string();
        config.upstream.pool.clear();
        config.auth.realm.clear();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::Zero {
            field: "listener.max_connections"
        }));
        assert!(errors.contains(&ValidationError::Empty {
            field: "upstream.pool"
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::WrongScheme { field: "upstream.ajp_base", .. })));
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = TranslationConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
