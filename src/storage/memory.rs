use dashmap::DashMap;

use crate::storage::KeyValueStore;

/// In-process store; plays the short-term (per-run) role.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.inner.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
