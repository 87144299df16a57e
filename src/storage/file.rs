//! JSON-file-backed store.
//!
//! Every mutation rewrites the file. Session material is small and written
//! rarely, so a full rewrite keeps the on-disk copy trivially consistent.

use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::storage::KeyValueStore;

#[derive(Debug)]
pub struct FileStore {
    inner: DashMap<String, String>,
    path: PathBuf,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries if the file exists.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self {
            inner: DashMap::new(),
            path,
        };

        if store.path.exists() {
            let reader = BufReader::new(File::open(&store.path)?);
            let map: HashMap<String, String> = serde_json::from_reader(reader)?;
            for (k, v) in map {
                store.inner.insert(k, v);
            }
            tracing::info!(path = %store.path.display(), entries = store.inner.len(), "Loaded session store");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all entries to disk.
    pub fn save(&self) -> std::io::Result<()> {
        let map: HashMap<String, String> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(writer, &map)?;
        tracing::debug!(path = %self.path.display(), entries = map.len(), "Saved session store");
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist session store");
        }
    }
}

impl KeyValueStore for FileStore {
    fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.inner.insert(key.to_string(), value);
        self.persist();
    }

    fn remove(&self, key: &str) -> bool {
        let removed = self.inner.remove(key).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
