//! Startup orchestration.
//!
//! Config is loaded and validated before anything else; any failure here is
//! fatal. The relay adapter is only registered when the host supplies a
//! transport factory.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{self, ConfigError, WalletConfig};
use crate::coordinator::Coordinator;
use crate::node::{LocalAccounts, NodeClient, NodeError};
use crate::provider::{LocalNodeProvider, RelayTransportFactory};
use crate::storage::{FileStore, KeyValueStore, MemoryStore, SessionPurge};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("node: {0}")]
    Node(#[from] NodeError),

    #[error("session store: {0}")]
    Storage(#[from] std::io::Error),
}

/// Load `path`, or defaults when absent; environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<WalletConfig, ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => {
            let mut config = WalletConfig::default();
            config::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            config::validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Long-term store from `storage_path`, in-memory otherwise; short-term is always in-memory.
pub fn session_purge(config: &WalletConfig) -> std::io::Result<SessionPurge> {
    let long_term: Arc<dyn KeyValueStore> = match &config.relay.storage_path {
        Some(path) => Arc::new(FileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(SessionPurge::new(long_term, Arc::new(MemoryStore::new())))
}

/// Wire adapters from config into a coordinator.
pub async fn build_coordinator(
    config: &WalletConfig,
    relay_factory: Option<Arc<dyn RelayTransportFactory>>,
) -> Result<Coordinator, StartupError> {
    let mut builder = Coordinator::builder(config.clone());

    if config.node.enabled {
        let node = NodeClient::new(config.node.clone()).await?;
        let accounts = LocalAccounts::from_env()?;
        if accounts.is_empty() {
            tracing::warn!("No local accounts configured, injected connects will be rejected");
        }
        tracing::info!(rpc_url = %config.node.rpc_url, accounts = accounts.addresses().len(), "Injected provider ready");
        builder = builder.injected(Arc::new(LocalNodeProvider::new(node, accounts)));
    }

    match (config.relay.enabled, relay_factory) {
        (true, Some(factory)) => {
            let purge = session_purge(config)?;
            tracing::info!(project_id = %config.relay.project_id, "Relay provider ready");
            builder = builder.relay(factory, purge);
        }
        (true, None) => tracing::warn!("Relay enabled but no relay transport is available"),
        (false, _) => {}
    }

    Ok(builder.build())
}
