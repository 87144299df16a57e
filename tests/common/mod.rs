//! Shared mocks for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use wallet_coordinator::config::WalletConfig;
use wallet_coordinator::provider::{
    Eip1193Provider, EventEmitter, EventName, EventSource, JsonRpcProvider, Listener, ListenerId, ProviderEvent,
    RelayInitOptions, RelaySession, RelayTransport, RelayTransportFactory, RpcRequest, TransportError,
};
use wallet_coordinator::storage::SessionPurge;
use wallet_coordinator::Coordinator;

pub const ADDRESS: &str = "0xABC0000000000000000000000000000000000001";
pub const ONE_ETHER_HEX: &str = "0xde0b6b3a7640000";
pub const STALE_MESSAGE: &str = "No matching key. session topic doesn't exist: 4f1c";

/// Config with every external transport disabled and timings at their defaults.
pub fn test_config() -> WalletConfig {
    let mut config = WalletConfig::default();
    config.node.enabled = false;
    config.relay.enabled = true;
    config
}

/// Let spawned tasks and timers run for `ms` of (paused) time.
pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Scriptable injected provider.
pub struct MockInjected {
    pub emitter: EventEmitter,
    pub address: Mutex<String>,
    pub chain_hex: Mutex<String>,
    pub gas_wei: Mutex<u64>,
    pub authorized: AtomicBool,
    pub reject: AtomicBool,
    pub hang: AtomicBool,
    pub hold: AtomicBool,
    pub release: Notify,
    pub gas_fail: AtomicBool,
    pub request_accounts: AtomicUsize,
    pub gas_requests: AtomicUsize,
    pub revokes: AtomicUsize,
}

impl MockInjected {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            emitter: EventEmitter::new(),
            address: Mutex::new(ADDRESS.to_string()),
            chain_hex: Mutex::new("0x1".to_string()),
            gas_wei: Mutex::new(30_000_000_000),
            authorized: AtomicBool::new(false),
            reject: AtomicBool::new(false),
            hang: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            release: Notify::new(),
            gas_fail: AtomicBool::new(false),
            request_accounts: AtomicUsize::new(0),
            gas_requests: AtomicUsize::new(0),
            revokes: AtomicUsize::new(0),
        })
    }

    pub fn emit(&self, event: ProviderEvent) -> usize {
        self.emitter.emit(&event)
    }

    pub fn set_chain(&self, hex: &str) {
        *self.chain_hex.lock().unwrap() = hex.to_string();
    }

    pub fn set_address(&self, address: &str) {
        *self.address.lock().unwrap() = address.to_string();
    }

    pub fn listeners(&self) -> usize {
        [EventName::AccountsChanged, EventName::ChainChanged, EventName::Disconnect]
            .into_iter()
            .map(|e| self.emitter.listener_count(e))
            .sum()
    }

    fn accounts(&self) -> Value {
        if self.authorized.load(Ordering::SeqCst) {
            json!([self.address.lock().unwrap().clone()])
        } else {
            json!([])
        }
    }
}

#[async_trait]
impl JsonRpcProvider for MockInjected {
    async fn request(&self, request: RpcRequest) -> Result<Value, TransportError> {
        match request.method.as_str() {
            "eth_requestAccounts" => {
                self.request_accounts.fetch_add(1, Ordering::SeqCst);
                if self.hang.load(Ordering::SeqCst) {
                    std::future::pending::<()>().await;
                }
                if self.hold.load(Ordering::SeqCst) {
                    self.release.notified().await;
                }
                if self.reject.load(Ordering::SeqCst) {
                    return Err(TransportError::user_rejected("User rejected the request."));
                }
                self.authorized.store(true, Ordering::SeqCst);
                Ok(self.accounts())
            }
            "eth_accounts" => Ok(self.accounts()),
            "eth_chainId" => Ok(json!(self.chain_hex.lock().unwrap().clone())),
            "eth_getBalance" => Ok(json!(ONE_ETHER_HEX)),
            "eth_gasPrice" => {
                self.gas_requests.fetch_add(1, Ordering::SeqCst);
                if self.gas_fail.load(Ordering::SeqCst) {
                    return Err(TransportError::internal("node unreachable"));
                }
                Ok(json!(format!("{:#x}", *self.gas_wei.lock().unwrap())))
            }
            "wallet_revokePermissions" => {
                self.revokes.fetch_add(1, Ordering::SeqCst);
                self.authorized.store(false, Ordering::SeqCst);
                Ok(Value::Null)
            }
            other => Err(TransportError::unsupported(other)),
        }
    }
}

impl EventSource for MockInjected {
    fn on(&self, event: EventName, listener: Listener) -> ListenerId {
        self.emitter.on(event, listener)
    }

    fn remove_listener(&self, event: EventName, id: ListenerId) {
        self.emitter.remove_listener(event, id);
    }
}

impl Eip1193Provider for MockInjected {}

/// Relay transport that writes session keys the way a real SDK would.
pub struct MockRelayTransport {
    pub emitter: EventEmitter,
    pub connected: AtomicBool,
    pub topic: Mutex<Option<String>>,
    pub stale: bool,
    pub disconnects: AtomicUsize,
    pub gas_requests: AtomicUsize,
    purge: SessionPurge,
}

impl MockRelayTransport {
    pub fn emit(&self, event: ProviderEvent) -> usize {
        self.emitter.emit(&event)
    }
}

#[async_trait]
impl JsonRpcProvider for MockRelayTransport {
    async fn request(&self, request: RpcRequest) -> Result<Value, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::internal(STALE_MESSAGE));
        }
        match request.method.as_str() {
            "eth_accounts" => Ok(json!([ADDRESS])),
            "eth_chainId" => Ok(json!("0x89")),
            "eth_getBalance" => Ok(json!(ONE_ETHER_HEX)),
            "eth_gasPrice" => {
                self.gas_requests.fetch_add(1, Ordering::SeqCst);
                Ok(json!("0x6fc23ac00"))
            }
            other => Err(TransportError::unsupported(other)),
        }
    }
}

impl EventSource for MockRelayTransport {
    fn on(&self, event: EventName, listener: Listener) -> ListenerId {
        self.emitter.on(event, listener)
    }

    fn remove_listener(&self, event: EventName, id: ListenerId) {
        self.emitter.remove_listener(event, id);
    }
}

#[async_trait]
impl RelayTransport for MockRelayTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.purge
            .short_term()
            .set("wc@2:core:0.3//messages", "{}".to_string());
        if self.stale {
            return Err(TransportError::internal(STALE_MESSAGE));
        }
        self.connected.store(true, Ordering::SeqCst);
        *self.topic.lock().unwrap() = Some("a1b2c3".to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        *self.topic.lock().unwrap() = None;
        Ok(())
    }

    fn session(&self) -> Option<RelaySession> {
        self.topic.lock().unwrap().clone().map(|topic| RelaySession { topic, expiry: None })
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn remove_all_listeners(&self, event: EventName) {
        self.emitter.remove_all_listeners(event);
    }
}

/// Hands out mock transports; the first `stale_connects` fail with a stale session.
pub struct MockRelayFactory {
    pub purge: SessionPurge,
    pub inits: AtomicUsize,
    pub stale_connects: AtomicUsize,
    pub last: Mutex<Option<Arc<MockRelayTransport>>>,
}

impl MockRelayFactory {
    pub fn new(purge: SessionPurge) -> Arc<Self> {
        Arc::new(Self {
            purge,
            inits: AtomicUsize::new(0),
            stale_connects: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn last(&self) -> Arc<MockRelayTransport> {
        self.last.lock().unwrap().clone().expect("no transport initialised")
    }
}

#[async_trait]
impl RelayTransportFactory for MockRelayFactory {
    async fn init(&self, options: &RelayInitOptions) -> Result<Arc<dyn RelayTransport>, TransportError> {
        assert!(!options.project_id.is_empty());
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.purge
            .long_term()
            .set("wc@2:client:0.3//session", "{}".to_string());

        let stale = self
            .stale_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let transport = Arc::new(MockRelayTransport {
            emitter: EventEmitter::new(),
            connected: AtomicBool::new(false),
            topic: Mutex::new(None),
            stale,
            disconnects: AtomicUsize::new(0),
            gas_requests: AtomicUsize::new(0),
            purge: self.purge.clone(),
        });
        *self.last.lock().unwrap() = Some(transport.clone());
        Ok(transport)
    }
}

/// Count of relay-namespace keys across both stores.
pub fn relay_keys(purge: &SessionPurge) -> usize {
    purge
        .long_term()
        .keys()
        .into_iter()
        .chain(purge.short_term().keys())
        .filter(|k| k.starts_with("wc@2") || k.contains("walletconnect"))
        .count()
}

pub fn injected_coordinator(mock: &Arc<MockInjected>) -> Coordinator {
    Coordinator::builder(test_config()).injected(mock.clone()).build()
}

pub fn full_coordinator(mock: &Arc<MockInjected>, factory: &Arc<MockRelayFactory>) -> Coordinator {
    Coordinator::builder(test_config())
        .injected(mock.clone())
        .relay(factory.clone(), factory.purge.clone())
        .build()
}
