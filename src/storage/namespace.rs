//! Relay key recognition and purge.

use std::sync::Arc;

use crate::observability::metrics;
use crate::storage::{KeyValueStore, MemoryStore};

/// Key prefixes written by the relay transport and its pairing modal.
pub const RELAY_KEY_PREFIXES: &[&str] = &["wc@2", "walletconnect", "@walletconnect", "wc:", "WCM_", "WALLETCONNECT_"];

/// Decides which keys belong to the relay.
#[derive(Debug, Clone)]
pub struct SessionNamespace {
    prefixes: Vec<String>,
    contains: Vec<String>,
}

impl SessionNamespace {
    pub fn relay() -> Self {
        Self {
            prefixes: RELAY_KEY_PREFIXES.iter().map(|p| p.to_string()).collect(),
            contains: vec!["walletconnect".to_string()],
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
            || self.contains.iter().any(|c| key.contains(c.as_str()))
    }
}

impl Default for SessionNamespace {
    fn default() -> Self {
        Self::relay()
    }
}

/// Keys removed by one purge, per store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub long_term: usize,
    pub short_term: usize,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.long_term + self.short_term
    }
}

/// Removes relay keys from the long-term and short-term stores.
#[derive(Clone)]
pub struct SessionPurge {
    namespace: SessionNamespace,
    long_term: Arc<dyn KeyValueStore>,
    short_term: Arc<dyn KeyValueStore>,
}

impl SessionPurge {
    pub fn new(long_term: Arc<dyn KeyValueStore>, short_term: Arc<dyn KeyValueStore>) -> Self {
        Self {
            namespace: SessionNamespace::relay(),
            long_term,
            short_term,
        }
    }

    /// Two fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn long_term(&self) -> &Arc<dyn KeyValueStore> {
        &self.long_term
    }

    pub fn short_term(&self) -> &Arc<dyn KeyValueStore> {
        &self.short_term
    }

    pub fn run(&self) -> PurgeReport {
        let report = PurgeReport {
            long_term: self.purge_store(self.long_term.as_ref()),
            short_term: self.purge_store(self.short_term.as_ref()),
        };
        if report.total() > 0 {
            tracing::info!(
                long_term = report.long_term,
                short_term = report.short_term,
                "Purged relay session keys"
            );
            metrics::record_keys_purged(report.total());
        }
        report
    }

    fn purge_store(&self, store: &dyn KeyValueStore) -> usize {
        store
            .keys()
            .into_iter()
            .filter(|key| self.namespace.matches(key))
            .filter(|key| store.remove(key))
            .count()
    }
}

impl std::fmt::Debug for SessionPurge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPurge")
            .field("namespace", &self.namespace)
            .field("long_term_keys", &self.long_term.len())
            .field("short_term_keys", &self.short_term.len())
            .finish()
    }
}
