//! Node-backed injected provider.
//!
//! Plays the role of a browser extension for headless hosts: accounts come
//! from local keys, chain state from a JSON-RPC node.

use alloy::primitives::{hex, Address, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::node::{LocalAccounts, NodeClient};
use crate::provider::emitter::EventEmitter;
use crate::provider::types::{EventName, Listener, ListenerId, ProviderEvent, RpcRequest, TransportError};
use crate::provider::{Eip1193Provider, EventSource, JsonRpcProvider};

#[derive(Debug)]
pub struct LocalNodeProvider {
    node: NodeClient,
    accounts: LocalAccounts,
    /// Set by `eth_requestAccounts`, cleared by `wallet_revokePermissions`.
    authorized: AtomicBool,
    emitter: EventEmitter,
}

impl LocalNodeProvider {
    pub fn new(node: NodeClient, accounts: LocalAccounts) -> Self {
        Self {
            node,
            accounts,
            authorized: AtomicBool::new(false),
            emitter: EventEmitter::new(),
        }
    }

    /// Push a notification to registered listeners, as a wallet UI would.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        self.emitter.emit(&event)
    }

    fn account_list(&self) -> Value {
        let addresses: Vec<String> = self.accounts.addresses().iter().map(|a| a.to_string()).collect();
        json!(addresses)
    }

    fn address_param(params: &Value, index: usize) -> Result<Address, TransportError> {
        params
            .get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::internal(format!("missing address parameter {}", index)))?
            .parse()
            .map_err(|e| TransportError::internal(format!("invalid address: {}", e)))
    }

    async fn personal_sign(&self, params: &Value) -> Result<Value, TransportError> {
        if !self.authorized.load(Ordering::SeqCst) {
            return Err(TransportError::new(TransportError::UNAUTHORIZED, "account access not granted"));
        }
        let data = params
            .get(0)
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::internal("missing message parameter"))?;
        let address = Self::address_param(params, 1)?;

        let message = match data.strip_prefix("0x") {
            Some(encoded) => hex::decode(encoded)
                .map_err(|e| TransportError::internal(format!("invalid hex message: {}", e)))?,
            None => data.as_bytes().to_vec(),
        };

        let signature = self.accounts.sign_message(address, &message).await?;
        Ok(json!(format!("0x{}", hex::encode(signature.as_bytes()))))
    }
}

#[async_trait]
impl JsonRpcProvider for LocalNodeProvider {
    async fn request(&self, request: RpcRequest) -> Result<Value, TransportError> {
        tracing::debug!(method = %request.method, "Local provider request");

        match request.method.as_str() {
            "eth_requestAccounts" => {
                if self.accounts.is_empty() {
                    return Err(TransportError::user_rejected("no local accounts configured"));
                }
                self.authorized.store(true, Ordering::SeqCst);
                Ok(self.account_list())
            }
            "eth_accounts" => {
                if self.authorized.load(Ordering::SeqCst) {
                    Ok(self.account_list())
                } else {
                    Ok(json!([]))
                }
            }
            "eth_chainId" => {
                let chain_id = self.node.get_chain_id().await?;
                Ok(json!(format!("{:#x}", chain_id)))
            }
            "eth_getBalance" => {
                let address = Self::address_param(&request.params, 0)?;
                let balance = self.node.get_balance(address).await?;
                Ok(json!(balance))
            }
            "eth_gasPrice" => {
                let price = self.node.get_gas_price().await?;
                Ok(json!(U256::from(price)))
            }
            "wallet_revokePermissions" => {
                if self.authorized.swap(false, Ordering::SeqCst) {
                    self.emitter.emit(&ProviderEvent::AccountsChanged(Vec::new()));
                }
                Ok(Value::Null)
            }
            "personal_sign" => self.personal_sign(&request.params).await,
            other => Err(TransportError::unsupported(other)),
        }
    }
}

impl EventSource for LocalNodeProvider {
    fn on(&self, event: EventName, listener: Listener) -> ListenerId {
        self.emitter.on(event, listener)
    }

    fn remove_listener(&self, event: EventName, id: ListenerId) {
        self.emitter.remove_listener(event, id);
    }
}

impl Eip1193Provider for LocalNodeProvider {
    fn node_rpc(&self) -> Option<NodeClient> {
        Some(self.node.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    async fn provider(keys: &[&str]) -> LocalNodeProvider {
        let config = NodeConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 1,
            ..NodeConfig::default()
        };
        let node = NodeClient::new(config).await.unwrap();
        LocalNodeProvider::new(node, LocalAccounts::from_private_keys(keys).unwrap())
    }

    #[tokio::test]
    async fn test_accounts_require_authorization() {
        let provider = provider(&[TEST_PRIVATE_KEY]).await;

        let before = provider.request(RpcRequest::bare("eth_accounts")).await.unwrap();
        assert_eq!(before, json!([]));

        let granted = provider.request(RpcRequest::bare("eth_requestAccounts")).await.unwrap();
        assert_eq!(granted.as_array().unwrap().len(), 1);

        let after = provider.request(RpcRequest::bare("eth_accounts")).await.unwrap();
        assert_eq!(after, granted);
    }

    #[tokio::test]
    async fn test_request_accounts_without_keys_is_rejected() {
        let provider = provider(&[]).await;
        let err = provider.request(RpcRequest::bare("eth_requestAccounts")).await.unwrap_err();
        assert_eq!(err.code, TransportError::USER_REJECTED);
    }

    #[tokio::test]
    async fn test_revoke_emits_empty_accounts() {
        let provider = provider(&[TEST_PRIVATE_KEY]).await;
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        provider.on(EventName::AccountsChanged, Arc::new(move |event| {
            if event == &ProviderEvent::AccountsChanged(Vec::new()) {
                s.fetch_add(1, Ordering::SeqCst);
            }
        }));

        provider.request(RpcRequest::bare("eth_requestAccounts")).await.unwrap();
        provider
            .request(RpcRequest::new("wallet_revokePermissions", json!([{"eth_accounts": {}}])))
            .await
            .unwrap();
        // A second revoke is a no-op.
        provider
            .request(RpcRequest::new("wallet_revokePermissions", json!([{"eth_accounts": {}}])))
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_personal_sign() {
        let provider = provider(&[TEST_PRIVATE_KEY]).await;
        let accounts = provider.request(RpcRequest::bare("eth_requestAccounts")).await.unwrap();
        let address = accounts[0].as_str().unwrap().to_string();

        let signature = provider
            .request(RpcRequest::new("personal_sign", json!(["hello", address])))
            .await
            .unwrap();
        // 0x + 65 bytes hex
        assert_eq!(signature.as_str().unwrap().len(), 132);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let provider = provider(&[TEST_PRIVATE_KEY]).await;
        let err = provider.request(RpcRequest::bare("eth_sendTransaction")).await.unwrap_err();
        assert_eq!(err.code, TransportError::UNSUPPORTED_METHOD);
        assert!(provider.node_rpc().is_some());
    }
}
