//! Port traits implemented by infrastructure crates.
//!
//! The tracker defines *what* it needs from the outside world; the `appstore`,
//! `slack` and `kv-store` crates define *how* to supply it. Collaborators are
//! injected as `Arc<dyn Trait>` at construction time, so every trait here is
//! object-safe and `Send + Sync`.

use async_trait::async_trait;

use crate::{AppId, Block, ChannelId, ReleaseStatus, StorageKey, WatchError};

/// Source of the latest release status of an application.
#[async_trait]
pub trait ReleaseStatusSource: Send + Sync {
    /// Fetches the newest store version and its phased-rollout record.
    ///
    /// # Errors
    ///
    /// - [`WatchError::NoVersionFound`] when the application has no versions.
    /// - [`WatchError::Provider`] for transport failures and non-2xx responses.
    /// - [`WatchError::KeyImport`] / [`WatchError::Signing`] when no
    ///   authentication token could be produced.
    async fn fetch_latest_status(&self, app_id: &AppId) -> Result<ReleaseStatus, WatchError>;
}

/// Destination for formatted notifications.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Posts one message made of `blocks` to `channel`.
    ///
    /// # Errors
    ///
    /// [`WatchError::NotificationDelivery`] when the messaging service rejects
    /// the message or cannot be reached.
    async fn post_message(&self, channel: &ChannelId, blocks: &[Block]) -> Result<(), WatchError>;
}

/// External key-value storage with whole-value overwrite semantics.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`. Absence is `Ok(None)`.
    async fn get(&self, key: &StorageKey) -> Result<Option<String>, WatchError>;

    /// Replaces the value stored under `key`.
    ///
    /// A single write is atomic: readers observe either the old or the new
    /// value, never a partial one.
    async fn put(&self, key: &StorageKey, value: String) -> Result<(), WatchError>;
}
