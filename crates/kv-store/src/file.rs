//! Directory-backed store with whole-file atomic replacement.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use tracker::{KeyValueStore, StorageKey, WatchError};
use uuid::Uuid;

const VALUE_EXTENSION: &str = "json";

/// Directory-backed store: one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the stored values.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are percent-encoded so any key maps
    /// to a single file name inside the root.
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        let mut name = String::with_capacity(key.as_str().len() + 5);
        for byte in key.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-') {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        name.push('.');
        name.push_str(VALUE_EXTENSION);
        self.root.join(name)
    }
}

fn storage_error(key: &StorageKey, action: &str, err: std::io::Error) -> WatchError {
    WatchError::Storage {
        key: key.to_string(),
        message: format!("{action}: {err}"),
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>, WatchError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(key, "read failed", e)),
        }
    }

    async fn put(&self, key: &StorageKey, value: String) -> Result<(), WatchError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| storage_error(key, "could not create state directory", e))?;

        let target = self.path_for(key);
        let staging = self
            .root
            .join(format!(".{}.tmp", Uuid::new_v4().simple()));

        tokio::fs::write(&staging, value.as_bytes())
            .await
            .map_err(|e| storage_error(key, "write failed", e))?;

        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(storage_error(key, "replace failed", e));
        }

        debug!(key = %key, path = %target.display(), "Stored value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_safe_file_names() {
        let store = FileStore::new("/state");
        let plain = StorageKey::new("lastStatus_6443771811").unwrap();
        assert_eq!(
            store.path_for(&plain),
            PathBuf::from("/state/lastStatus_6443771811.json")
        );

        let hostile = StorageKey::new("../etc/passwd").unwrap();
        assert_eq!(
            store.path_for(&hostile),
            PathBuf::from("/state/%2E%2E%2Fetc%2Fpasswd.json")
        );
    }
}
