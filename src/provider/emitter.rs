//! Listener bookkeeping for transports that push notifications.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::provider::types::{EventName, Listener, ListenerId, ProviderEvent};

/// A minimal `on` / `removeListener` / `emit` registry.
#[derive(Default)]
pub struct EventEmitter {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<EventName, Vec<(ListenerId, Listener)>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; several listeners per event are allowed.
    pub fn on(&self, event: EventName, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove one listener. Returns false if it was not registered.
    pub fn remove_listener(&self, event: EventName, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        match listeners.get_mut(&event) {
            Some(entries) => {
                let before = entries.len();
                entries.retain(|(existing, _)| *existing != id);
                entries.len() != before
            }
            None => false,
        }
    }

    pub fn remove_all_listeners(&self, event: EventName) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event);
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map_or(0, Vec::len)
    }

    /// Deliver an event to every listener registered for its name.
    ///
    /// Listeners run outside the lock so they may (un)register freely.
    pub fn emit(&self, event: &ProviderEvent) -> usize {
        let targets: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.name())
            .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&'static str, usize> =
            listeners.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventEmitter").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_emit_reaches_registered_listeners() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        emitter.on(EventName::ChainChanged, Arc::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(emitter.emit(&ProviderEvent::ChainChanged("0x1".into())), 1);
        assert_eq!(emitter.emit(&ProviderEvent::AccountsChanged(vec![])), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_listener() {
        let emitter = EventEmitter::new();
        let id = emitter.on(EventName::AccountsChanged, Arc::new(|_| {}));
        emitter.on(EventName::AccountsChanged, Arc::new(|_| {}));

        assert!(emitter.remove_listener(EventName::AccountsChanged, id));
        assert!(!emitter.remove_listener(EventName::AccountsChanged, id));
        assert_eq!(emitter.listener_count(EventName::AccountsChanged), 1);

        emitter.remove_all_listeners(EventName::AccountsChanged);
        assert_eq!(emitter.listener_count(EventName::AccountsChanged), 0);
    }
}
