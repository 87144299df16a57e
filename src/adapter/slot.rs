//! Single-slot listener registry.
//!
//! Each adapter owns one slot per purpose. Installing a new set of
//! listeners first removes whatever the slot held, so subscriptions
//! replace and never stack.

use std::sync::{Arc, Mutex, PoisonError};

use crate::provider::{EventName, EventSource, ListenerId};

struct Registration<T: ?Sized> {
    source: Arc<T>,
    ids: Vec<(EventName, ListenerId)>,
}

pub struct ListenerSlot<T: EventSource + ?Sized> {
    current: Mutex<Option<Registration<T>>>,
}

impl<T: EventSource + ?Sized> ListenerSlot<T> {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Remove the previous registrations, then let `register` install new ones on `source`.
    pub fn replace<F>(&self, source: Arc<T>, register: F)
    where
        F: FnOnce(&T) -> Vec<(EventName, ListenerId)>,
    {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            Self::remove(previous);
        }
        let ids = register(&source);
        *current = Some(Registration { source, ids });
    }

    /// Remove all registrations. Returns the number removed; safe to repeat.
    pub fn clear(&self) -> usize {
        let previous = self.current.lock().unwrap_or_else(PoisonError::into_inner).take();
        previous.map_or(0, Self::remove)
    }

    pub fn is_empty(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn remove(registration: Registration<T>) -> usize {
        for (event, id) in &registration.ids {
            registration.source.remove_listener(*event, *id);
        }
        registration.ids.len()
    }
}

impl<T: EventSource + ?Sized> Default for ListenerSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{EventEmitter, Listener};

    struct Source(EventEmitter);

    impl EventSource for Source {
        fn on(&self, event: EventName, listener: Listener) -> ListenerId {
            self.0.on(event, listener)
        }

        fn remove_listener(&self, event: EventName, id: ListenerId) {
            self.0.remove_listener(event, id);
        }
    }

    fn register(source: &Source) -> Vec<(EventName, ListenerId)> {
        vec![
            (EventName::AccountsChanged, source.on(EventName::AccountsChanged, Arc::new(|_| {}))),
            (EventName::ChainChanged, source.on(EventName::ChainChanged, Arc::new(|_| {}))),
        ]
    }

    #[test]
    fn test_replace_never_stacks() {
        let source = Arc::new(Source(EventEmitter::new()));
        let slot: ListenerSlot<Source> = ListenerSlot::new();

        slot.replace(source.clone(), register);
        slot.replace(source.clone(), register);
        slot.replace(source.clone(), register);

        assert_eq!(source.0.listener_count(EventName::AccountsChanged), 1);
        assert_eq!(source.0.listener_count(EventName::ChainChanged), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let source = Arc::new(Source(EventEmitter::new()));
        let slot: ListenerSlot<Source> = ListenerSlot::new();
        slot.replace(source.clone(), register);

        assert_eq!(slot.clear(), 2);
        assert_eq!(slot.clear(), 0);
        assert!(slot.is_empty());
        assert_eq!(source.0.listener_count(EventName::AccountsChanged), 0);
    }
}
