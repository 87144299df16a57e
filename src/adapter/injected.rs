//! Adapter over a locally injected provider.

use alloy::primitives::U256;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::adapter::guard::ConnectGuard;
use crate::adapter::slot::ListenerSlot;
use crate::adapter::types::{parse_chain_id, ProviderKind, WalletError, WalletInfo, WalletResult};
use crate::adapter::{first_account, load_wallet_info, request_gas_price, ChangeHandlers, DisconnectReason, WalletAdapter};
use crate::provider::{Eip1193Provider, EventName, ListenerId, ProviderEvent, RpcRequest};

pub struct InjectedAdapter {
    provider: Option<Arc<dyn Eip1193Provider>>,
    connecting: AtomicBool,
    listeners: ListenerSlot<dyn Eip1193Provider>,
}

impl InjectedAdapter {
    /// `None` models a host with no provider installed.
    pub fn new(provider: Option<Arc<dyn Eip1193Provider>>) -> Self {
        Self {
            provider,
            connecting: AtomicBool::new(false),
            listeners: ListenerSlot::new(),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> WalletResult<&Arc<dyn Eip1193Provider>> {
        self.provider
            .as_ref()
            .ok_or(WalletError::NotInstalled(ProviderKind::Injected))
    }
}

impl std::fmt::Debug for InjectedAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectedAdapter")
            .field("installed", &self.is_installed())
            .field("subscribed", &!self.listeners.is_empty())
            .finish()
    }
}

fn register_handlers(provider: &dyn Eip1193Provider, handlers: ChangeHandlers) -> Vec<(EventName, ListenerId)> {
    let ChangeHandlers {
        on_accounts,
        on_chain,
        on_disconnect,
    } = handlers;

    let accounts = provider.on(
        EventName::AccountsChanged,
        Arc::new(move |event| {
            if let ProviderEvent::AccountsChanged(list) = event {
                on_accounts(list.clone());
            }
        }),
    );
    let chain = provider.on(
        EventName::ChainChanged,
        Arc::new(move |event| {
            if let ProviderEvent::ChainChanged(raw) = event {
                match parse_chain_id(raw) {
                    Some(id) => on_chain(id),
                    None => tracing::warn!(chain_id = %raw, "Ignoring unparseable chain id"),
                }
            }
        }),
    );
    let disconnect = provider.on(
        EventName::Disconnect,
        Arc::new(move |event| {
            if let ProviderEvent::Disconnect { code, message } = event {
                on_disconnect(DisconnectReason::Provider {
                    code: *code,
                    message: message.clone(),
                });
            }
        }),
    );

    vec![
        (EventName::AccountsChanged, accounts),
        (EventName::ChainChanged, chain),
        (EventName::Disconnect, disconnect),
    ]
}

#[async_trait]
impl WalletAdapter for InjectedAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Injected
    }

    async fn connect(&self) -> WalletResult<WalletInfo> {
        let provider = self.provider()?;
        let _guard = ConnectGuard::acquire(&self.connecting)?;

        let accounts = provider
            .request(RpcRequest::bare("eth_requestAccounts"))
            .await
            .map_err(|e| WalletError::HandshakeFailed(e.message))?;
        let address = first_account(&accounts)
            .map_err(|e| WalletError::HandshakeFailed(e.message))?
            .ok_or_else(|| WalletError::HandshakeFailed("wallet returned no accounts".to_string()))?;

        let info = load_wallet_info(provider.as_ref(), address, ProviderKind::Injected)
            .await
            .map_err(|e| WalletError::HandshakeFailed(e.message))?;

        tracing::info!(address = %info.address, chain_id = info.chain_id, "Injected wallet connected");
        Ok(info)
    }

    async fn disconnect(&self) {
        let Some(provider) = self.provider.as_ref() else {
            return;
        };
        let request = RpcRequest::new("wallet_revokePermissions", json!([{ "eth_accounts": {} }]));
        if let Err(e) = provider.request(request).await {
            tracing::debug!(error = %e, "Permission revoke not honored by provider");
        }
    }

    async fn query_info(&self) -> WalletResult<Option<WalletInfo>> {
        let Some(provider) = self.provider.as_ref() else {
            return Ok(None);
        };

        let accounts = provider
            .request(RpcRequest::bare("eth_accounts"))
            .await
            .map_err(|e| WalletError::InfoUnavailable(e.message))?;
        let Some(address) = first_account(&accounts).map_err(|e| WalletError::InfoUnavailable(e.message))? else {
            return Ok(None);
        };

        load_wallet_info(provider.as_ref(), address, ProviderKind::Injected)
            .await
            .map(Some)
            .map_err(|e| WalletError::InfoUnavailable(e.message))
    }

    fn subscribe_changes(&self, handlers: ChangeHandlers) {
        let Some(provider) = self.provider.clone() else {
            return;
        };
        self.listeners
            .replace(provider, move |source| register_handlers(source, handlers));
    }

    fn unsubscribe_all(&self) {
        let removed = self.listeners.clear();
        if removed > 0 {
            tracing::debug!(removed, "Injected listeners removed");
        }
    }

    async fn fetch_gas_price(&self) -> WalletResult<U256> {
        let provider = self.provider()?;
        match provider.node_rpc() {
            Some(node) => node
                .get_gas_price()
                .await
                .map(U256::from)
                .map_err(|e| WalletError::FetchFailed(e.to_string())),
            None => request_gas_price(provider.as_ref()).await,
        }
    }
}
