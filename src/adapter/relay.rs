//! Adapter over a pairing relay transport.
//!
//! The relay keeps session material in persisted storage, so the adapter's
//! in-memory belief can drift from what the relay knows. Every read checks
//! `is_session_valid` first and every failed handshake drops the transport
//! handle, so the next attempt always initialises a fresh one.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

use crate::adapter::guard::ConnectGuard;
use crate::adapter::slot::ListenerSlot;
use crate::adapter::types::{parse_chain_id, ProviderKind, WalletError, WalletInfo, WalletResult};
use crate::adapter::{first_account, load_wallet_info, request_gas_price, ChangeHandlers, DisconnectReason, WalletAdapter};
use crate::provider::{
    EventName, ListenerId, ProviderEvent, RelayInitOptions, RelayTransport, RelayTransportFactory, RpcRequest,
    TransportError,
};
use crate::storage::SessionPurge;

/// Error fragments the relay uses for sessions it no longer knows.
const STALE_SESSION_MARKERS: &[&str] = &["session topic doesn't exist", "No matching key. session topic"];

const ALL_EVENTS: &[EventName] = &[
    EventName::AccountsChanged,
    EventName::ChainChanged,
    EventName::Connect,
    EventName::Disconnect,
    EventName::Error,
    EventName::DisplayUri,
    EventName::SessionUpdate,
    EventName::SessionDelete,
    EventName::SessionEvent,
];

pub fn is_stale_session_message(message: &str) -> bool {
    STALE_SESSION_MARKERS.iter().any(|m| message.contains(m))
}

fn classify(err: TransportError) -> WalletError {
    if is_stale_session_message(&err.message) {
        WalletError::StaleSession(err.message)
    } else {
        WalletError::HandshakeFailed(err.message)
    }
}

pub struct RelayAdapter {
    factory: Arc<dyn RelayTransportFactory>,
    options: RelayInitOptions,
    transport: Mutex<Option<Arc<dyn RelayTransport>>>,
    purge: SessionPurge,
    connecting: AtomicBool,
    listeners: ListenerSlot<dyn RelayTransport>,
    lifecycle: ListenerSlot<dyn RelayTransport>,
}

impl RelayAdapter {
    pub fn new(factory: Arc<dyn RelayTransportFactory>, options: RelayInitOptions, purge: SessionPurge) -> Self {
        Self {
            factory,
            options,
            transport: Mutex::new(None),
            purge,
            connecting: AtomicBool::new(false),
            listeners: ListenerSlot::new(),
            lifecycle: ListenerSlot::new(),
        }
    }

    pub fn has_transport(&self) -> bool {
        self.current().is_some()
    }

    pub fn purge(&self) -> &SessionPurge {
        &self.purge
    }

    fn current(&self) -> Option<Arc<dyn RelayTransport>> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Detach the handle and every listener on it.
    fn take_transport(&self) -> Option<Arc<dyn RelayTransport>> {
        let transport = self.transport.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.listeners.clear();
        self.lifecycle.clear();
        transport
    }

    async fn ensure_transport(&self) -> WalletResult<Arc<dyn RelayTransport>> {
        if let Some(existing) = self.current() {
            return Ok(existing);
        }

        tracing::info!(
            project_id = %self.options.project_id,
            chains = ?self.options.chains,
            "Initializing relay transport"
        );
        let transport = match self.factory.init(&self.options).await {
            Ok(transport) => transport,
            Err(e) => {
                tracing::error!(error = %e, "Relay transport initialization failed");
                self.purge.run();
                return Err(classify(e));
            }
        };

        self.lifecycle
            .replace(transport.clone(), |source| register_lifecycle_logging(source));
        *self.transport.lock().unwrap_or_else(PoisonError::into_inner) = Some(transport.clone());
        Ok(transport)
    }

    async fn handshake(&self, transport: &dyn RelayTransport) -> WalletResult<WalletInfo> {
        transport.connect().await.map_err(classify)?;

        let accounts = transport
            .request(RpcRequest::bare("eth_accounts"))
            .await
            .map_err(classify)?;
        let address = first_account(&accounts)
            .map_err(classify)?
            .ok_or_else(|| WalletError::HandshakeFailed("wallet approved no accounts".to_string()))?;

        load_wallet_info(transport, address, ProviderKind::Relay)
            .await
            .map_err(classify)
    }
}

impl std::fmt::Debug for RelayAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayAdapter")
            .field("options", &self.options)
            .field("has_transport", &self.has_transport())
            .finish()
    }
}

fn register_lifecycle_logging(transport: &dyn RelayTransport) -> Vec<(EventName, ListenerId)> {
    let logged = [
        EventName::DisplayUri,
        EventName::Connect,
        EventName::SessionUpdate,
        EventName::SessionEvent,
        EventName::Error,
    ];
    logged
        .into_iter()
        .map(|event| {
            let id = transport.on(
                event,
                Arc::new(|event: &ProviderEvent| match event {
                    ProviderEvent::DisplayUri(uri) => tracing::info!(%uri, "Relay pairing URI ready"),
                    ProviderEvent::Connect { chain_id } => tracing::info!(%chain_id, "Relay transport connected"),
                    ProviderEvent::Error(e) => tracing::warn!(code = e.code, message = %e.message, "Relay transport error"),
                    other => tracing::debug!(event = %other.name(), "Relay session notification"),
                }),
            );
            (event, id)
        })
        .collect()
}

fn register_handlers(transport: &dyn RelayTransport, handlers: ChangeHandlers) -> Vec<(EventName, ListenerId)> {
    let ChangeHandlers {
        on_accounts,
        on_chain,
        on_disconnect,
    } = handlers;

    let accounts = transport.on(
        EventName::AccountsChanged,
        Arc::new(move |event| {
            if let ProviderEvent::AccountsChanged(list) = event {
                on_accounts(list.clone());
            }
        }),
    );
    let chain = transport.on(
        EventName::ChainChanged,
        Arc::new(move |event| {
            if let ProviderEvent::ChainChanged(raw) = event {
                if let Some(id) = parse_chain_id(raw) {
                    on_chain(id);
                }
            }
        }),
    );

    let notify = on_disconnect.clone();
    let disconnect = transport.on(
        EventName::Disconnect,
        Arc::new(move |event| {
            if let ProviderEvent::Disconnect { code, message } = event {
                notify(DisconnectReason::Provider {
                    code: *code,
                    message: message.clone(),
                });
            }
        }),
    );
    let notify = on_disconnect.clone();
    let deleted = transport.on(
        EventName::SessionDelete,
        Arc::new(move |event| {
            if let ProviderEvent::SessionDelete { topic } = event {
                notify(DisconnectReason::StaleSession(format!("session {} deleted by wallet", topic)));
            }
        }),
    );
    let errored = transport.on(
        EventName::Error,
        Arc::new(move |event| {
            if let ProviderEvent::Error(e) = event {
                if is_stale_session_message(&e.message) {
                    on_disconnect(DisconnectReason::StaleSession(e.message.clone()));
                }
            }
        }),
    );

    vec![
        (EventName::AccountsChanged, accounts),
        (EventName::ChainChanged, chain),
        (EventName::Disconnect, disconnect),
        (EventName::SessionDelete, deleted),
        (EventName::Error, errored),
    ]
}

#[async_trait]
impl WalletAdapter for RelayAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Relay
    }

    async fn connect(&self) -> WalletResult<WalletInfo> {
        let _guard = ConnectGuard::acquire(&self.connecting)?;

        // Every pairing starts from a fresh transport and an empty namespace.
        if let Some(leftover) = self.take_transport() {
            tracing::debug!("Discarding leftover relay transport before connecting");
            for event in ALL_EVENTS {
                leftover.remove_all_listeners(*event);
            }
            if transport_session_valid(leftover.as_ref()) {
                if let Err(e) = leftover.disconnect().await {
                    tracing::debug!(error = %e, "Leftover relay transport disconnect failed");
                }
            }
        }
        self.purge.run();

        let transport = self.ensure_transport().await?;

        match self.handshake(transport.as_ref()).await {
            Ok(info) => {
                tracing::info!(address = %info.address, chain_id = info.chain_id, "Relay wallet connected");
                Ok(info)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Relay handshake failed, dropping transport");
                if let Some(transport) = self.take_transport() {
                    for event in ALL_EVENTS {
                        transport.remove_all_listeners(*event);
                    }
                }
                Err(e)
            }
        }
    }

    async fn disconnect(&self) {
        let Some(transport) = self.take_transport() else {
            return;
        };

        if !transport_session_valid(transport.as_ref()) {
            tracing::debug!("Relay session already invalid, skipping disconnect call");
            return;
        }
        if let Err(e) = transport.disconnect().await {
            tracing::debug!(error = %e, "Relay disconnect failed");
            if is_stale_session_message(&e.message) {
                self.purge.run();
            }
        }
    }

    async fn query_info(&self) -> WalletResult<Option<WalletInfo>> {
        let transport = self.ensure_transport().await.map_err(|e| WalletError::InfoUnavailable(e.to_string()))?;
        if !transport_session_valid(transport.as_ref()) {
            tracing::debug!("Relay session invalid, no wallet info");
            return Ok(None);
        }

        let map_err = |e: TransportError| match classify(e) {
            WalletError::HandshakeFailed(message) => WalletError::InfoUnavailable(message),
            other => other,
        };
        let accounts = transport
            .request(RpcRequest::bare("eth_accounts"))
            .await
            .map_err(map_err)?;
        let Some(address) = first_account(&accounts).map_err(map_err)? else {
            return Ok(None);
        };

        load_wallet_info(transport.as_ref(), address, ProviderKind::Relay)
            .await
            .map(Some)
            .map_err(map_err)
    }

    fn subscribe_changes(&self, handlers: ChangeHandlers) {
        match self.current() {
            Some(transport) => self
                .listeners
                .replace(transport, move |source| register_handlers(source, handlers)),
            None => tracing::debug!("No relay transport to subscribe to"),
        }
    }

    fn unsubscribe_all(&self) {
        let removed = self.listeners.clear();
        if removed > 0 {
            tracing::debug!(removed, "Relay listeners removed");
        }
    }

    async fn fetch_gas_price(&self) -> WalletResult<U256> {
        let transport = self.current().ok_or(WalletError::NotConnected)?;
        match transport.node_rpc() {
            Some(node) => node
                .get_gas_price()
                .await
                .map(U256::from)
                .map_err(|e| WalletError::FetchFailed(e.to_string())),
            None => request_gas_price(transport.as_ref()).await,
        }
    }

    fn is_session_valid(&self) -> bool {
        self.current()
            .is_some_and(|transport| transport_session_valid(transport.as_ref()))
    }

    async fn force_cleanup(&self) -> usize {
        if let Some(transport) = self.take_transport() {
            for event in ALL_EVENTS {
                transport.remove_all_listeners(*event);
            }
        }
        self.purge.run().total()
    }
}

fn transport_session_valid(transport: &dyn RelayTransport) -> bool {
    transport.connected() && transport.session().is_some_and(|s| !s.topic.is_empty())
}
