//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Check URLs and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WalletConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::WalletConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &WalletConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.session.handshake_timeout_secs == 0 {
        errors.push(ValidationError::new("session.handshake_timeout_secs", "must be greater than zero"));
    }
    if config.gas.poll_interval_ms == 0 {
        errors.push(ValidationError::new("gas.poll_interval_ms", "must be greater than zero"));
    }

    if config.relay.enabled {
        if config.relay.project_id.trim().is_empty() {
            errors.push(ValidationError::new("relay.project_id", "must not be empty"));
        }
        if config.relay.chains.is_empty() {
            errors.push(ValidationError::new("relay.chains", "at least one required chain"));
        }
        if url::Url::parse(&config.relay.metadata.url).is_err() {
            errors.push(ValidationError::new(
                "relay.metadata.url",
                format!("invalid URL '{}'", config.relay.metadata.url),
            ));
        }
    }

    if config.node.enabled {
        if url::Url::parse(&config.node.rpc_url).is_err() {
            errors.push(ValidationError::new(
                "node.rpc_url",
                format!("invalid URL '{}'", config.node.rpc_url),
            ));
        }
        for failover in &config.node.failover_urls {
            if url::Url::parse(failover).is_err() {
                errors.push(ValidationError::new(
                    "node.failover_urls",
                    format!("invalid URL '{}'", failover),
                ));
            }
        }
        if config.node.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new("node.rpc_timeout_secs", "must be greater than zero"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WalletConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = WalletConfig::default();
        config.gas.poll_interval_ms = 0;
        config.node.rpc_url = "not a url".to_string();
        config.relay.enabled = true;
        config.relay.chains.clear();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["gas.poll_interval_ms", "relay.chains", "node.rpc_url"]);
    }

    #[test]
    fn test_disabled_sections_are_skipped() {
        let mut config = WalletConfig::default();
        config.node.enabled = false;
        config.node.rpc_url = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
