//! Read-only node access for chain id, balances and gas price.
//!
//! Endpoints are tried in config order (primary, then failovers); each call
//! is bounded by `rpc_timeout_secs`. An unreachable node is not an error at
//! construction time.

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::node::types::{NodeConfig, NodeError, NodeResult};

type DynProvider = Arc<dyn Provider + Send + Sync>;

#[derive(Clone)]
struct Endpoint {
    url: String,
    provider: DynProvider,
}

fn endpoint(raw: &str) -> NodeResult<Endpoint> {
    let parsed: url::Url = raw.parse().map_err(|e: url::ParseError| NodeError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Endpoint {
        url: raw.to_string(),
        provider: Arc::new(ProviderBuilder::new().connect_http(parsed)),
    })
}

/// Node client shared by the local provider and the gas monitor.
#[derive(Clone)]
pub struct NodeClient {
    endpoints: Vec<Endpoint>,
    config: NodeConfig,
    timeout: Duration,
}

impl NodeClient {
    /// Fails only on an unparseable primary URL. Bad failover URLs are skipped.
    pub async fn new(config: NodeConfig) -> NodeResult<Self> {
        let mut endpoints = vec![endpoint(&config.rpc_url)?];
        for url in &config.failover_urls {
            match endpoint(url) {
                Ok(ep) => endpoints.push(ep),
                Err(e) => tracing::warn!(error = %e, "Skipping failover node endpoint"),
            }
        }

        let client = Self {
            endpoints,
            timeout: Duration::from_secs(config.rpc_timeout_secs),
            config,
        };

        if let Err(e) = client.verify_chain_id().await {
            tracing::warn!(error = %e, rpc_url = %client.config.rpc_url, "Node chain not verified");
        } else {
            tracing::info!(rpc_url = %client.config.rpc_url, chain_id = client.config.chain_id, "Node client ready");
        }
        Ok(client)
    }

    pub async fn verify_chain_id(&self) -> NodeResult<()> {
        let actual = self.get_chain_id().await?;
        if actual != self.config.chain_id {
            return Err(NodeError::WrongChain {
                expected: self.config.chain_id,
                actual,
            });
        }
        Ok(())
    }

    pub async fn get_chain_id(&self) -> NodeResult<u64> {
        self.first_answer("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
    }

    pub async fn get_balance(&self, address: Address) -> NodeResult<U256> {
        self.first_answer("eth_getBalance", move |p| async move { p.get_balance(address).await })
            .await
    }

    /// Gas price in wei.
    pub async fn get_gas_price(&self) -> NodeResult<u128> {
        self.first_answer("eth_gasPrice", |p| async move { p.get_gas_price().await })
            .await
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Run `call` against each endpoint until one answers in time.
    async fn first_answer<T, E, F, Fut>(&self, method: &'static str, call: F) -> NodeResult<T>
    where
        E: Display,
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut last = String::from("no endpoints configured");
        for ep in &self.endpoints {
            match tokio::time::timeout(self.timeout, call(ep.provider.clone())).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    tracing::warn!(method, endpoint = %ep.url, error = %e, "Node request failed");
                    last = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(method, endpoint = %ep.url, timeout_secs = self.timeout.as_secs(), "Node request timed out");
                    last = format!("timed out after {}s", self.timeout.as_secs());
                }
            }
        }
        Err(NodeError::Unavailable {
            method,
            endpoints: self.endpoints.len(),
            last,
        })
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("endpoints", &self.endpoints.iter().map(|ep| ep.url.as_str()).collect::<Vec<_>>())
            .field("chain_id", &self.config.chain_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> NodeConfig {
        NodeConfig {
            enabled: true,
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: vec!["not a url".to_string(), "http://127.0.0.1:2".to_string()],
            chain_id: 31337,
            rpc_timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn test_unreachable_node_is_not_fatal() {
        let client = NodeClient::new(unreachable()).await.unwrap();
        assert_eq!(client.endpoints.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_primary_url() {
        let config = NodeConfig {
            rpc_url: "::not a url::".to_string(),
            ..unreachable()
        };
        let err = NodeClient::new(config).await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_every_endpoint_is_tried() {
        let client = NodeClient::new(unreachable()).await.unwrap();
        match client.get_gas_price().await.unwrap_err() {
            NodeError::Unavailable { method, endpoints, .. } => {
                assert_eq!(method, "eth_gasPrice");
                assert_eq!(endpoints, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
