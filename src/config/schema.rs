//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the coordinator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the wallet coordinator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Connection lifecycle settings.
    pub session: SessionConfig,

    /// Relay (pairing-based) transport settings.
    pub relay: RelayConfig,

    /// Gas price monitoring settings.
    pub gas: GasConfig,

    /// JSON-RPC node backing the local injected provider.
    pub node: NodeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Connection lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Caller-visible handshake timeout in seconds.
    pub handshake_timeout_secs: u64,

    /// Extra wait after a stale-session cleanup before a relay handshake is retried.
    pub reconnect_delay_ms: u64,
}

impl SessionConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_secs: 90,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Relay transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Register the relay adapter.
    pub enabled: bool,

    /// Project identifier handed to the relay transport.
    pub project_id: String,

    /// Chains the wallet must support.
    pub chains: Vec<u64>,

    /// Chains the wallet may additionally approve.
    pub optional_chains: Vec<u64>,

    /// Ask the transport to render its pairing QR modal.
    pub show_qr_modal: bool,

    /// Wait between the two purge passes of stale-session recovery.
    pub settle_delay_ms: u64,

    /// Optional file backing the long-term session store.
    pub storage_path: Option<String>,

    /// Metadata shown to the remote wallet during pairing.
    pub metadata: RelayMetadataConfig,
}

impl RelayConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: "demo-project-id".to_string(),
            chains: vec![1],
            optional_chains: vec![42161, 137, 10, 8453, 11155111],
            show_qr_modal: true,
            settle_delay_ms: 1000,
            storage_path: None,
            metadata: RelayMetadataConfig::default(),
        }
    }
}

/// Application metadata presented to the remote wallet.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayMetadataConfig {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

impl Default for RelayMetadataConfig {
    fn default() -> Self {
        Self {
            name: "Wallet Coordinator".to_string(),
            description: "Injected and relay wallet sessions with live gas pricing".to_string(),
            url: "http://localhost".to_string(),
            icons: Vec::new(),
        }
    }
}

/// Gas price monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    /// Polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Manual refresh requests closer together than this collapse into one fetch.
    pub refresh_debounce_ms: u64,
}

impl GasConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            refresh_debounce_ms: 500,
        }
    }
}

/// JSON-RPC node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Register the node-backed injected provider.
    pub enabled: bool,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Expected chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
