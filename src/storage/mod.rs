//! Persisted session namespace.
//!
//! The relay transport keeps pairing and session material in key/value
//! stores that outlive a single connection. Recovery purges the relay's
//! keys from both stores and leaves everything else alone.

pub mod file;
pub mod memory;
pub mod namespace;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use namespace::{PurgeReport, SessionNamespace, SessionPurge};

/// Minimal string key/value store.
pub trait KeyValueStore: Send + Sync {
    fn keys(&self) -> Vec<String>;

    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    /// Returns true if the key existed.
    fn remove(&self, key: &str) -> bool;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
