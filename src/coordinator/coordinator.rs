//! Connection state machine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use uuid::Uuid;

use crate::adapter::{
    DisconnectReason, InjectedAdapter, ProviderKind, RelayAdapter, WalletAdapter, WalletError, WalletInfo,
    WalletResult,
};
use crate::config::WalletConfig;
use crate::coordinator::events::{EventRelay, SessionSignal, TaggedSignal};
use crate::coordinator::state::{
    ConnectionState, LifecycleEvent, WalletState, SESSION_ENDED_MESSAGE, STALE_CONNECT_MESSAGE,
};
use crate::gas::{GasPriceInfo, GasPriceMonitor};
use crate::observability::metrics;
use crate::provider::{Eip1193Provider, RelayInitOptions, RelayTransportFactory};
use crate::session::{RecoveryReport, SessionEntry, SessionRegistry, StaleSessionRecovery};
use crate::storage::SessionPurge;

const EVENT_CAPACITY: usize = 64;

struct Inner {
    adapters: HashMap<ProviderKind, Arc<dyn WalletAdapter>>,
    registry: SessionRegistry,
    state: watch::Sender<WalletState>,
    events: broadcast::Sender<LifecycleEvent>,
    relay: EventRelay,
    gas: GasPriceMonitor,
    recovery: StaleSessionRecovery,
    /// The last relay failure was a stale session; clean up before the next handshake.
    stale_pending: AtomicBool,
    generation: AtomicU64,
    handshake_timeout: Duration,
    reconnect_delay: Duration,
}

/// Drives connect/disconnect for every registered adapter.
///
/// Cheap to clone; clones share one state machine.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn builder(config: WalletConfig) -> CoordinatorBuilder {
        CoordinatorBuilder::new(config)
    }

    /// Connect through the adapter registered for `kind`.
    ///
    /// Rejected with `AlreadyConnecting` while a connect or disconnect is in
    /// progress. An existing session is torn down first.
    pub async fn connect(&self, kind: ProviderKind) -> WalletResult<WalletInfo> {
        metrics::record_connect_attempt(kind);

        let Some(adapter) = self.inner.adapters.get(&kind).cloned() else {
            let err = WalletError::NotInstalled(kind);
            tracing::warn!(%kind, "No adapter registered for provider kind");
            self.inner.state.send_modify(|s| s.error = Some(err.to_string()));
            metrics::record_connect_outcome(kind, "not_installed");
            return Err(err);
        };

        let mut previous = ConnectionState::Disconnected;
        let claimed = self.inner.state.send_if_modified(|s| {
            if s.connection.is_transitioning() {
                return false;
            }
            previous = s.connection;
            s.connection = ConnectionState::Connecting;
            s.error = None;
            true
        });
        if !claimed {
            tracing::debug!(%kind, "Connect rejected, another transition is in progress");
            metrics::record_connect_outcome(kind, "already_connecting");
            return Err(WalletError::AlreadyConnecting);
        }
        metrics::record_connection_state(ConnectionState::Connecting.code());

        let attempt = Uuid::new_v4();
        tracing::info!(%kind, %attempt, "Connecting wallet");
        self.emit(LifecycleEvent::Connecting { kind, attempt });

        if previous == ConnectionState::Connected {
            tracing::info!(%attempt, "Replacing the active session");
            self.inner.teardown_session().await;
        }

        if kind == ProviderKind::Relay && self.inner.stale_pending.swap(false, Ordering::SeqCst) {
            tracing::info!(%attempt, "Previous relay session was stale, cleaning up before handshake");
            let report = self.inner.recovery.run(adapter.as_ref()).await;
            self.emit(LifecycleEvent::RecoveryCompleted(report));
            tokio::time::sleep(self.inner.reconnect_delay).await;
        }

        let result = match tokio::time::timeout(self.inner.handshake_timeout, adapter.connect()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(%attempt, timeout_secs = self.inner.handshake_timeout.as_secs(), "Handshake timed out");
                adapter.disconnect().await;
                Err(WalletError::HandshakeFailed(format!(
                    "wallet did not respond within {}s",
                    self.inner.handshake_timeout.as_secs()
                )))
            }
        };

        match result {
            Ok(info) => {
                self.inner.establish(kind, adapter, info.clone());
                tracing::info!(%attempt, address = %info.address, chain = %info.chain_name, "Wallet connected");
                metrics::record_connect_outcome(kind, "connected");
                Ok(info)
            }
            Err(err) => {
                tracing::warn!(%attempt, error = %err, "Wallet connection failed");
                self.fail_connect(kind, adapter.as_ref(), &err).await;
                Err(err)
            }
        }
    }

    async fn fail_connect(&self, kind: ProviderKind, adapter: &dyn WalletAdapter, err: &WalletError) {
        let message = if err.is_stale_session() {
            let report = self.inner.recovery.run(adapter).await;
            self.inner.stale_pending.store(true, Ordering::SeqCst);
            self.emit(LifecycleEvent::RecoveryCompleted(report));
            metrics::record_connect_outcome(kind, "stale_session");
            STALE_CONNECT_MESSAGE.to_string()
        } else {
            metrics::record_connect_outcome(kind, "failed");
            err.to_string()
        };

        self.inner.gas.stop();
        self.inner.state.send_modify(|s| s.reset(Some(message)));
        metrics::record_connection_state(ConnectionState::Disconnected.code());
        self.emit(LifecycleEvent::ConnectFailed {
            kind,
            error: err.clone(),
        });
    }

    /// Tear down the active session. A no-op unless `Connected`.
    pub async fn disconnect(&self) {
        self.inner.end_session("user requested").await;
    }

    /// Restore a session the adapter already holds, without prompting.
    ///
    /// `Ok(None)` when there is nothing to restore.
    pub async fn restore(&self, kind: ProviderKind) -> WalletResult<Option<WalletInfo>> {
        let adapter = self
            .inner
            .adapters
            .get(&kind)
            .cloned()
            .ok_or(WalletError::NotInstalled(kind))?;

        let claimed = self.inner.state.send_if_modified(|s| {
            if s.connection != ConnectionState::Disconnected {
                return false;
            }
            s.connection = ConnectionState::Connecting;
            true
        });
        if !claimed {
            let state = self.state();
            return match state.connection {
                ConnectionState::Connected => Ok(Some(state.wallet)),
                _ => Err(WalletError::AlreadyConnecting),
            };
        }

        let result = match tokio::time::timeout(self.inner.handshake_timeout, adapter.query_info()).await {
            Ok(result) => result,
            Err(_) => Err(WalletError::InfoUnavailable("wallet did not respond".to_string())),
        };

        match result {
            Ok(Some(info)) => {
                tracing::info!(%kind, address = %info.address, "Restored existing wallet session");
                self.inner.establish(kind, adapter, info.clone());
                Ok(Some(info))
            }
            Ok(None) => {
                tracing::debug!(%kind, "No existing wallet session to restore");
                self.inner.state.send_modify(|s| s.reset(None));
                Ok(None)
            }
            Err(err) if err.is_stale_session() => {
                self.fail_connect(kind, adapter.as_ref(), &err).await;
                Err(err)
            }
            Err(err) => {
                tracing::debug!(%kind, error = %err, "Session restore failed");
                self.inner.state.send_modify(|s| s.reset(None));
                Err(err)
            }
        }
    }

    /// Re-read the connected account and republish it.
    pub async fn refresh_info(&self) -> WalletResult<Option<WalletInfo>> {
        self.inner.refresh_info().await
    }

    /// Run stale session recovery and settle in `Disconnected`.
    ///
    /// Returns `None` while a connect or disconnect is in progress.
    pub async fn recover_stale(&self) -> Option<RecoveryReport> {
        self.inner.recover_stale(SESSION_ENDED_MESSAGE).await
    }

    /// Debounced manual gas refresh. False when no session is active.
    pub fn refresh_gas_price(&self) -> bool {
        self.inner.gas.request_refresh()
    }

    /// Dismiss the current wallet and gas error messages.
    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|s| s.error.take().is_some());
        self.inner.gas.clear_error();
    }

    pub fn state(&self) -> WalletState {
        self.inner.state.borrow().clone()
    }

    pub fn is_connecting(&self) -> bool {
        self.inner.state.borrow().is_connecting()
    }

    pub fn wallet_info(&self) -> WalletInfo {
        self.inner.state.borrow().wallet.clone()
    }

    pub fn gas_info(&self) -> GasPriceInfo {
        self.inner.gas.snapshot()
    }

    pub fn active_kind(&self) -> Option<ProviderKind> {
        self.inner.registry.active_kind()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn is_gas_monitoring(&self) -> bool {
        self.inner.gas.is_monitoring()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WalletState> {
        self.inner.state.subscribe()
    }

    pub fn subscribe_gas(&self) -> watch::Receiver<GasPriceInfo> {
        self.inner.gas.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: LifecycleEvent) {
        self.inner.emit(event);
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.inner.state.borrow().connection)
            .field("active", &self.inner.registry.active_kind())
            .field("adapters", &self.inner.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Inner {
    fn emit(&self, event: LifecycleEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Install the session and start everything that depends on it.
    fn establish(&self, kind: ProviderKind, adapter: Arc<dyn WalletAdapter>, info: WalletInfo) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.registry.install(SessionEntry {
            kind,
            adapter: adapter.clone(),
            session_valid: true,
            generation,
        });
        self.relay.attach(adapter.clone(), generation);
        self.gas.start(adapter);

        self.state.send_modify(|s| {
            s.connection = ConnectionState::Connected;
            s.wallet = info.clone();
            s.error = None;
        });
        metrics::record_connection_state(ConnectionState::Connected.code());
        self.emit(LifecycleEvent::Connected { kind, info });
    }

    /// Unsubscribe, cancel polling, then release the adapter.
    async fn teardown_session(&self) -> Option<ProviderKind> {
        self.relay.detach();
        self.gas.stop();
        let entry = self.registry.clear()?;
        entry.adapter.disconnect().await;
        Some(entry.kind)
    }

    /// `Connected → Disconnecting → Disconnected`.
    async fn end_session(&self, reason: &str) -> bool {
        let claimed = self.state.send_if_modified(|s| {
            if s.connection != ConnectionState::Connected {
                return false;
            }
            s.connection = ConnectionState::Disconnecting;
            true
        });
        if !claimed {
            tracing::debug!(reason, "Disconnect ignored, no connected session");
            return false;
        }
        metrics::record_connection_state(ConnectionState::Disconnecting.code());

        let kind = self.teardown_session().await;
        self.state.send_modify(|s| s.reset(None));
        metrics::record_connection_state(ConnectionState::Disconnected.code());
        tracing::info!(reason, "Wallet disconnected");
        self.emit(LifecycleEvent::Disconnected {
            kind,
            reason: reason.to_string(),
        });
        true
    }

    async fn recover_stale(&self, message: &str) -> Option<RecoveryReport> {
        let claimed = self.state.send_if_modified(|s| {
            if s.connection.is_transitioning() {
                return false;
            }
            s.connection = ConnectionState::Disconnecting;
            true
        });
        if !claimed {
            tracing::debug!("Stale session recovery deferred, transition in progress");
            self.stale_pending.store(true, Ordering::SeqCst);
            return None;
        }

        self.registry.mark_invalid();
        self.relay.detach();
        self.gas.stop();
        let entry = self.registry.clear();
        let kind = entry.as_ref().map(|e| e.kind);
        let adapter = entry
            .map(|e| e.adapter.clone())
            .or_else(|| self.adapters.get(&ProviderKind::Relay).cloned());

        let report = match adapter {
            Some(adapter) => self.recovery.run(adapter.as_ref()).await,
            None => RecoveryReport::default(),
        };

        self.state.send_modify(|s| s.reset(Some(message.to_string())));
        metrics::record_connection_state(ConnectionState::Disconnected.code());
        self.emit(LifecycleEvent::RecoveryCompleted(report));
        self.emit(LifecycleEvent::Disconnected {
            kind,
            reason: message.to_string(),
        });
        Some(report)
    }

    async fn refresh_info(&self) -> WalletResult<Option<WalletInfo>> {
        let entry = self.registry.current().ok_or(WalletError::NotConnected)?;

        if !entry.adapter.is_session_valid() {
            tracing::warn!(kind = %entry.kind, "Session no longer valid while connected");
            self.recover_stale(SESSION_ENDED_MESSAGE).await;
            return Err(WalletError::StaleSession("session is no longer valid".to_string()));
        }

        match entry.adapter.query_info().await {
            Ok(Some(info)) => {
                let still_current = self
                    .registry
                    .current()
                    .is_some_and(|current| current.generation == entry.generation);
                if !still_current {
                    tracing::debug!("Discarding wallet info from a replaced session");
                    return Ok(None);
                }
                self.state.send_if_modified(|s| {
                    if s.connection != ConnectionState::Connected || s.wallet == info {
                        return false;
                    }
                    s.wallet = info.clone();
                    true
                });
                self.emit(LifecycleEvent::WalletUpdated(info.clone()));
                Ok(Some(info))
            }
            Ok(None) => {
                self.end_session("wallet no longer authorized").await;
                Ok(None)
            }
            Err(err) if err.is_stale_session() => {
                self.recover_stale(SESSION_ENDED_MESSAGE).await;
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Wallet info refresh failed");
                self.state.send_modify(|s| s.error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    async fn handle_signal(&self, tagged: TaggedSignal) {
        let current = self.registry.current().map(|entry| entry.generation);
        if current != Some(tagged.generation) {
            tracing::debug!(
                generation = tagged.generation,
                ?current,
                "Dropping notification from a previous session"
            );
            return;
        }

        match tagged.signal {
            SessionSignal::AccountsChanged(accounts) if accounts.is_empty() => {
                self.end_session("wallet reported no accounts").await;
            }
            SessionSignal::AccountsChanged(accounts) => {
                tracing::info!(account = %accounts[0], "Wallet account changed");
                let _ = self.refresh_info().await;
            }
            SessionSignal::ChainChanged(chain_id) => {
                tracing::info!(chain_id, "Wallet chain changed");
                // Apply the new chain right away; the refresh below fills in the balance.
                let mut updated = None;
                self.state.send_if_modified(|s| {
                    if s.connection != ConnectionState::Connected || s.wallet.chain_id == chain_id {
                        return false;
                    }
                    s.wallet.set_chain(chain_id);
                    updated = Some(s.wallet.clone());
                    true
                });
                if let Some(info) = updated {
                    self.emit(LifecycleEvent::WalletUpdated(info));
                }
                let _ = self.refresh_info().await;
            }
            SessionSignal::Disconnected(DisconnectReason::Provider { code, message }) => {
                tracing::info!(code, %message, "Wallet disconnected by provider");
                self.end_session("provider disconnected").await;
            }
            SessionSignal::Disconnected(DisconnectReason::StaleSession(message)) => {
                tracing::warn!(%message, "Relay reported a stale session");
                self.recover_stale(SESSION_ENDED_MESSAGE).await;
            }
        }
    }
}

/// Consume adapter notifications until the coordinator is dropped.
async fn drive(inner: Weak<Inner>, mut signals: mpsc::UnboundedReceiver<TaggedSignal>) {
    while let Some(tagged) = signals.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.handle_signal(tagged).await;
    }
    tracing::debug!("Coordinator driver exited");
}

/// Assembles a coordinator from config and the available transports.
pub struct CoordinatorBuilder {
    config: WalletConfig,
    adapters: HashMap<ProviderKind, Arc<dyn WalletAdapter>>,
}

impl CoordinatorBuilder {
    pub fn new(config: WalletConfig) -> Self {
        Self {
            config,
            adapters: HashMap::new(),
        }
    }

    /// Register the injected transport.
    pub fn injected(self, provider: Arc<dyn Eip1193Provider>) -> Self {
        self.adapter(Arc::new(InjectedAdapter::new(Some(provider))))
    }

    /// Register the relay transport, persisting session keys through `purge`'s stores.
    pub fn relay(self, factory: Arc<dyn RelayTransportFactory>, purge: SessionPurge) -> Self {
        let options = RelayInitOptions::from(&self.config.relay);
        self.adapter(Arc::new(RelayAdapter::new(factory, options, purge)))
    }

    /// Register any adapter; replaces one of the same kind.
    pub fn adapter(mut self, adapter: Arc<dyn WalletAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    /// Build and spawn the notification driver. Must run inside a tokio runtime.
    pub fn build(self) -> Coordinator {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let inner = Arc::new(Inner {
            adapters: self.adapters,
            registry: SessionRegistry::new(),
            state: watch::Sender::new(WalletState::default()),
            events,
            relay: EventRelay::new(signals_tx),
            gas: GasPriceMonitor::new(&self.config.gas),
            recovery: StaleSessionRecovery::new(self.config.relay.settle_delay()),
            stale_pending: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            handshake_timeout: self.config.session.handshake_timeout(),
            reconnect_delay: self.config.session.reconnect_delay(),
        });

        tokio::spawn(drive(Arc::downgrade(&inner), signals_rx));
        tracing::debug!(adapters = inner.adapters.len(), "Coordinator built");
        Coordinator { inner }
    }
}
