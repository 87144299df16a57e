//! Wallet data model and error taxonomy.

use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Known chain names, by chain id.
pub const CHAIN_NAMES: &[(u64, &str)] = &[
    (1, "Ethereum Mainnet"),
    (42161, "Arbitrum One"),
    (137, "Polygon"),
    (10, "Optimism"),
    (8453, "Base"),
    (11155111, "Sepolia Testnet"),
];

/// Human readable chain name, falling back to `Chain {id}`.
pub fn chain_name(chain_id: u64) -> String {
    CHAIN_NAMES
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Chain {}", chain_id))
}

/// Parse a chain id reported as hex (`0x89`) or decimal (`137`).
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Parse a JSON-RPC quantity: hex string, decimal string or JSON number.
pub fn parse_quantity(value: &Value) -> Option<U256> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x") {
                Some(hex) if hex.is_empty() => Some(U256::ZERO),
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_str_radix(s, 10).ok(),
            }
        }
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    }
}

/// Transport family a session runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Locally injected provider (browser extension style).
    Injected,
    /// Remote wallet reached through a pairing relay.
    Relay,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Injected => f.write_str("injected"),
            ProviderKind::Relay => f.write_str("relay"),
        }
    }
}

/// Account and chain snapshot of the connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: String,
    /// Balance in wei, decimal.
    pub balance_wei: String,
    pub chain_id: u64,
    pub chain_name: String,
    pub is_connected: bool,
    pub provider_kind: Option<ProviderKind>,
}

impl WalletInfo {
    /// Snapshot for a connected account.
    pub fn connected(address: impl Into<String>, balance: U256, chain_id: u64, kind: ProviderKind) -> Self {
        let address = address.into();
        Self {
            is_connected: !address.is_empty(),
            address,
            balance_wei: balance.to_string(),
            chain_id,
            chain_name: chain_name(chain_id),
            provider_kind: Some(kind),
        }
    }

    /// Balance rendered in ether.
    pub fn balance_ether(&self) -> String {
        U256::from_str_radix(&self.balance_wei, 10)
            .map(format_ether)
            .unwrap_or_else(|_| "0".to_string())
    }

    /// Update chain fields in place.
    pub fn set_chain(&mut self, chain_id: u64) {
        self.chain_id = chain_id;
        self.chain_name = chain_name(chain_id);
    }
}

impl Default for WalletInfo {
    fn default() -> Self {
        Self {
            address: String::new(),
            balance_wei: "0".to_string(),
            chain_id: 0,
            chain_name: String::new(),
            is_connected: false,
            provider_kind: None,
        }
    }
}

/// Errors surfaced by adapters and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The transport for this provider kind is absent.
    #[error("{0} wallet provider is not installed")]
    NotInstalled(ProviderKind),

    /// A connect is already in flight.
    #[error("a wallet connection is already in progress")]
    AlreadyConnecting,

    /// User rejection, timeout or transport fault during the handshake.
    #[error("wallet handshake failed: {0}")]
    HandshakeFailed(String),

    /// The relay no longer knows the session the adapter believes in.
    #[error("stale relay session: {0}")]
    StaleSession(String),

    /// Account or chain data could not be read.
    #[error("wallet info unavailable: {0}")]
    InfoUnavailable(String),

    /// Fee data read failed.
    #[error("Failed to fetch gas price: {0}")]
    FetchFailed(String),

    /// The operation needs an active session.
    #[error("no wallet session is active")]
    NotConnected,
}

impl WalletError {
    pub fn is_stale_session(&self) -> bool {
        matches!(self, WalletError::StaleSession(_))
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chain_names() {
        assert_eq!(chain_name(1), "Ethereum Mainnet");
        assert_eq!(chain_name(8453), "Base");
        assert_eq!(chain_name(999999), "Chain 999999");
    }

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(parse_chain_id("0x1"), Some(1));
        assert_eq!(parse_chain_id("0x89"), Some(137));
        assert_eq!(parse_chain_id("42161"), Some(42161));
        assert_eq!(parse_chain_id("0xzz"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x6fc23ac00")), Some(U256::from(30_000_000_000u64)));
        assert_eq!(parse_quantity(&json!("1000")), Some(U256::from(1000)));
        assert_eq!(parse_quantity(&json!(7)), Some(U256::from(7)));
        assert_eq!(parse_quantity(&json!("0x")), Some(U256::ZERO));
        assert_eq!(parse_quantity(&json!(null)), None);
    }

    #[test]
    fn test_connected_info() {
        let info = WalletInfo::connected("0xabc", U256::from(10u64).pow(U256::from(18)), 137, ProviderKind::Injected);
        assert!(info.is_connected);
        assert_eq!(info.chain_name, "Polygon");
        assert_eq!(info.balance_wei, "1000000000000000000");
        assert_eq!(info.balance_ether(), "1.000000000000000000");
    }

    #[test]
    fn test_default_info_is_disconnected() {
        let info = WalletInfo::default();
        assert!(!info.is_connected);
        assert!(info.address.is_empty());
        assert_eq!(info.provider_kind, None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            WalletError::NotInstalled(ProviderKind::Injected).to_string(),
            "injected wallet provider is not installed"
        );
        assert!(WalletError::StaleSession("x".into()).is_stale_session());
        assert!(!WalletError::AlreadyConnecting.is_stale_session());
    }
}
