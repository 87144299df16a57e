//! Relay (pairing-based) transport capability.
//!
//! The relay SDK itself is an external collaborator; this module only pins
//! down the surface the relay adapter relies on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::provider::types::TransportError;
use crate::provider::{EventSource, JsonRpcProvider};

/// Metadata shown to the remote wallet while pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

/// Options a relay transport is initialised with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayInitOptions {
    pub project_id: String,
    /// Chains the wallet must approve.
    pub chains: Vec<u64>,
    /// Chains the wallet may approve in addition.
    pub optional_chains: Vec<u64>,
    pub show_qr_modal: bool,
    pub metadata: RelayMetadata,
}

impl From<&RelayConfig> for RelayInitOptions {
    fn from(config: &RelayConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            chains: config.chains.clone(),
            optional_chains: config.optional_chains.clone(),
            show_qr_modal: config.show_qr_modal,
            metadata: RelayMetadata {
                name: config.metadata.name.clone(),
                description: config.metadata.description.clone(),
                url: config.metadata.url.clone(),
                icons: config.metadata.icons.clone(),
            },
        }
    }
}

/// Session material the transport holds once a wallet approved the pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySession {
    pub topic: String,
    /// Unix timestamp after which the relay drops the session.
    pub expiry: Option<u64>,
}

/// A live relay transport instance.
#[async_trait]
pub trait RelayTransport: JsonRpcProvider + EventSource {
    /// Pair with a remote wallet and wait for its approval.
    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    fn session(&self) -> Option<RelaySession>;

    fn connected(&self) -> bool;

    fn remove_all_listeners(&self, event: crate::provider::EventName);

    fn node_rpc(&self) -> Option<crate::node::NodeClient> {
        None
    }
}

/// Creates relay transports; one fresh transport per connection attempt.
#[async_trait]
pub trait RelayTransportFactory: Send + Sync {
    async fn init(&self, options: &RelayInitOptions) -> Result<Arc<dyn RelayTransport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let config = RelayConfig::default();
        let options = RelayInitOptions::from(&config);
        assert_eq!(options.project_id, "demo-project-id");
        assert_eq!(options.chains, vec![1]);
        assert_eq!(options.optional_chains, vec![42161, 137, 10, 8453, 11155111]);
        assert!(options.show_qr_modal);
    }
}
