//! Event relay between the active adapter and the coordinator.
//!
//! Adapter callbacks are synchronous, so the relay only tags each
//! notification with the session generation and queues it. The coordinator's
//! driver task does the async work and drops anything from an older session.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::adapter::{ChangeHandlers, DisconnectReason, WalletAdapter};

/// A normalized adapter notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
    Disconnected(DisconnectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSignal {
    pub generation: u64,
    pub signal: SessionSignal,
}

pub struct EventRelay {
    signals: mpsc::UnboundedSender<TaggedSignal>,
    attached: Mutex<Option<Arc<dyn WalletAdapter>>>,
}

impl EventRelay {
    pub fn new(signals: mpsc::UnboundedSender<TaggedSignal>) -> Self {
        Self {
            signals,
            attached: Mutex::new(None),
        }
    }

    /// Subscribe to `adapter` on behalf of session `generation`.
    ///
    /// Detaches from any previously attached adapter first.
    pub fn attach(&self, adapter: Arc<dyn WalletAdapter>, generation: u64) {
        self.detach();

        let send = {
            let signals = self.signals.clone();
            move |signal: SessionSignal| {
                if signals.send(TaggedSignal { generation, signal }).is_err() {
                    tracing::debug!(generation, "Coordinator gone, dropping wallet notification");
                }
            }
        };
        let on_accounts = send.clone();
        let on_chain = send.clone();
        adapter.subscribe_changes(ChangeHandlers {
            on_accounts: Arc::new(move |accounts| on_accounts(SessionSignal::AccountsChanged(accounts))),
            on_chain: Arc::new(move |chain_id| on_chain(SessionSignal::ChainChanged(chain_id))),
            on_disconnect: Arc::new(move |reason| send(SessionSignal::Disconnected(reason))),
        });

        tracing::debug!(kind = %adapter.kind(), generation, "Event relay attached");
        *self.attached.lock().unwrap_or_else(PoisonError::into_inner) = Some(adapter);
    }

    /// Unsubscribe from the attached adapter. Returns false if none was attached.
    pub fn detach(&self) -> bool {
        let previous = self.attached.lock().unwrap_or_else(PoisonError::into_inner).take();
        match previous {
            Some(adapter) => {
                adapter.unsubscribe_all();
                tracing::debug!(kind = %adapter.kind(), "Event relay detached");
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

impl std::fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRelay")
            .field("attached", &self.is_attached())
            .finish()
    }
}
