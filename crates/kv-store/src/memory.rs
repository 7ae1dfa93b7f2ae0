//! Process-local store backed by a locked map.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracker::{KeyValueStore, StorageKey, WatchError};

/// In-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys. Still answers after a writer panicked.
    pub fn len(&self) -> usize {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the map; a poisoned lock becomes a [`WatchError::Storage`] for `key`.
    fn lock_data(
        &self,
        key: &StorageKey,
    ) -> Result<MutexGuard<'_, HashMap<String, String>>, WatchError> {
        self.data.lock().map_err(|e| WatchError::Storage {
            key: key.to_string(),
            message: format!("lock poisoned: {e}"),
        })
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>, WatchError> {
        let data = self.lock_data(key)?;
        Ok(data.get(key.as_str()).cloned())
    }

    async fn put(&self, key: &StorageKey, value: String) -> Result<(), WatchError> {
        let mut data = self.lock_data(key)?;
        data.insert(key.as_str().to_string(), value);
        Ok(())
    }
}
