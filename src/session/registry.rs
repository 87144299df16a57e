//! The single active-adapter slot.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::adapter::{ProviderKind, WalletAdapter};

/// One active session.
pub struct SessionEntry {
    pub kind: ProviderKind,
    pub adapter: Arc<dyn WalletAdapter>,
    /// Validity as last observed by the coordinator.
    pub session_valid: bool,
    /// Connect generation this session belongs to.
    pub generation: u64,
}

impl std::fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEntry")
            .field("kind", &self.kind)
            .field("session_valid", &self.session_valid)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Holds at most one active session.
///
/// Readers take lock-free snapshots; only the coordinator installs or clears.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slot: ArcSwapOption<SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<SessionEntry>> {
        self.slot.load_full()
    }

    pub fn is_active(&self) -> bool {
        self.slot.load().is_some()
    }

    pub fn active_kind(&self) -> Option<ProviderKind> {
        self.slot.load().as_ref().map(|entry| entry.kind)
    }

    /// Install `entry`, returning whatever it displaced.
    pub(crate) fn install(&self, entry: SessionEntry) -> Option<Arc<SessionEntry>> {
        let previous = self.slot.swap(Some(Arc::new(entry)));
        if let Some(previous) = &previous {
            tracing::warn!(kind = %previous.kind, "Session registry displaced an active session");
        }
        previous
    }

    /// Flip the validity flag of the current entry, keeping everything else.
    pub(crate) fn mark_invalid(&self) {
        self.slot.rcu(|current| {
            current.as_ref().map(|entry| {
                Arc::new(SessionEntry {
                    kind: entry.kind,
                    adapter: entry.adapter.clone(),
                    session_valid: false,
                    generation: entry.generation,
                })
            })
        });
    }

    pub(crate) fn clear(&self) -> Option<Arc<SessionEntry>> {
        self.slot.swap(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::InjectedAdapter;

    fn entry(generation: u64) -> SessionEntry {
        SessionEntry {
            kind: ProviderKind::Injected,
            adapter: Arc::new(InjectedAdapter::new(None)),
            session_valid: true,
            generation,
        }
    }

    #[test]
    fn test_install_and_clear() {
        let registry = SessionRegistry::new();
        assert!(!registry.is_active());

        assert!(registry.install(entry(1)).is_none());
        assert_eq!(registry.active_kind(), Some(ProviderKind::Injected));

        let displaced = registry.install(entry(2)).unwrap();
        assert_eq!(displaced.generation, 1);
        assert_eq!(registry.current().unwrap().generation, 2);

        assert!(registry.clear().is_some());
        assert!(registry.clear().is_none());
    }

    #[test]
    fn test_mark_invalid() {
        let registry = SessionRegistry::new();
        registry.mark_invalid();
        assert!(registry.current().is_none());

        registry.install(entry(3));
        registry.mark_invalid();
        let current = registry.current().unwrap();
        assert!(!current.session_valid);
        assert_eq!(current.generation, 3);
    }
}
