//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::WalletConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the relay project identifier.
pub const RELAY_PROJECT_ID_ENV_VAR: &str = "WALLET_RELAY_PROJECT_ID";

/// Overrides the node RPC endpoint.
pub const NODE_RPC_URL_ENV_VAR: &str = "WALLET_NODE_RPC_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WalletConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse, apply environment overrides and validate configuration text.
pub fn parse_config(content: &str) -> Result<WalletConfig, ConfigError> {
    let mut config: WalletConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment variable overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut WalletConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project_id) = lookup(RELAY_PROJECT_ID_ENV_VAR).filter(|v| !v.is_empty()) {
        config.relay.project_id = project_id;
    }
    if let Some(rpc_url) = lookup(NODE_RPC_URL_ENV_VAR).filter(|v| !v.is_empty()) {
        tracing::debug!(rpc_url = %rpc_url, "Node RPC URL overridden from environment");
        config.node.rpc_url = rpc_url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nhandshake_timeout_secs = 30").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.session.handshake_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = parse_config("[gas]\npoll_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("gas.poll_interval_ms"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[gas\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = WalletConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            RELAY_PROJECT_ID_ENV_VAR => Some("abc123".to_string()),
            NODE_RPC_URL_ENV_VAR => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.relay.project_id, "abc123");
        assert_eq!(config.node.rpc_url, "http://localhost:8545");
    }
}
