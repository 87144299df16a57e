//! Provider adapters.
//!
//! # Data Flow
//! ```text
//! Coordinator
//!     → WalletAdapter (connect / disconnect / query_info / subscribe)
//!         → InjectedAdapter → Eip1193Provider
//!         → RelayAdapter    → RelayTransportFactory → RelayTransport
//!     ← WalletInfo, change callbacks, WalletError
//! ```
//!
//! # Design Decisions
//! - The coordinator depends on the `WalletAdapter` trait only
//! - Re-entrant `connect` is rejected (`AlreadyConnecting`), never queued
//! - `disconnect` and `unsubscribe_all` never fail and may be repeated
//! - One listener slot per adapter: subscribing replaces, never stacks

pub mod guard;
pub mod injected;
pub mod relay;
pub mod slot;
pub mod types;

use alloy::primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;

use crate::provider::{JsonRpcProvider, RpcRequest, TransportError};

pub use injected::InjectedAdapter;
pub use relay::{is_stale_session_message, RelayAdapter};
pub use types::{chain_name, ProviderKind, WalletError, WalletInfo, WalletResult};

/// Why a provider ended the session on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The provider emitted a regular disconnect notification.
    Provider { code: i64, message: String },
    /// The relay reported the session as gone or invalid.
    StaleSession(String),
}

/// Callbacks an adapter forwards normalized notifications to.
#[derive(Clone)]
pub struct ChangeHandlers {
    pub on_accounts: Arc<dyn Fn(Vec<String>) + Send + Sync>,
    pub on_chain: Arc<dyn Fn(u64) + Send + Sync>,
    pub on_disconnect: Arc<dyn Fn(DisconnectReason) + Send + Sync>,
}

impl std::fmt::Debug for ChangeHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHandlers").finish_non_exhaustive()
    }
}

/// Uniform capability interface over one wallet transport.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Run the interactive handshake and return the connected account.
    async fn connect(&self) -> WalletResult<WalletInfo>;

    /// Best-effort revoke; clears the session handle on every outcome.
    async fn disconnect(&self);

    /// Non-interactive read. `Ok(None)` when no authorized session exists.
    async fn query_info(&self) -> WalletResult<Option<WalletInfo>>;

    /// Install the single active handler set, replacing any previous one.
    fn subscribe_changes(&self, handlers: ChangeHandlers);

    /// Remove every change listener. Idempotent.
    fn unsubscribe_all(&self);

    /// Current network fee in wei.
    async fn fetch_gas_price(&self) -> WalletResult<U256>;

    fn is_session_valid(&self) -> bool {
        true
    }

    /// Purge persisted session artifacts; returns the number of keys removed.
    async fn force_cleanup(&self) -> usize {
        0
    }
}

/// Read balance and chain for `address` through `provider`.
pub(crate) async fn load_wallet_info<P>(
    provider: &P,
    address: String,
    kind: ProviderKind,
) -> Result<WalletInfo, TransportError>
where
    P: JsonRpcProvider + ?Sized,
{
    let balance = provider
        .request(RpcRequest::new("eth_getBalance", serde_json::json!([address, "latest"])))
        .await?;
    let balance = types::parse_quantity(&balance)
        .ok_or_else(|| TransportError::internal(format!("malformed balance {}", balance)))?;

    let chain = provider.request(RpcRequest::bare("eth_chainId")).await?;
    let chain_id = chain
        .as_str()
        .and_then(types::parse_chain_id)
        .or_else(|| chain.as_u64())
        .ok_or_else(|| TransportError::internal(format!("malformed chain id {}", chain)))?;

    Ok(WalletInfo::connected(address, balance, chain_id, kind))
}

/// Decode an account list response, returning the first account.
pub(crate) fn first_account(value: &serde_json::Value) -> Result<Option<String>, TransportError> {
    let accounts: Vec<String> = serde_json::from_value(value.clone())
        .map_err(|e| TransportError::internal(format!("malformed account list: {}", e)))?;
    Ok(accounts.into_iter().find(|a| !a.is_empty()))
}

/// Fetch `eth_gasPrice` through the generic request path.
pub(crate) async fn request_gas_price<P>(provider: &P) -> WalletResult<U256>
where
    P: JsonRpcProvider + ?Sized,
{
    let value = provider
        .request(RpcRequest::bare("eth_gasPrice"))
        .await
        .map_err(|e| WalletError::FetchFailed(e.message))?;
    types::parse_quantity(&value).ok_or_else(|| WalletError::FetchFailed(format!("malformed gas price {}", value)))
}
