//! Core domain for the release tracker.
//!
//! This crate contains every domain concept, newtype identifier, value type and
//! error type used across the workspace, plus the two pieces of pure business
//! logic: change detection and status formatting. Infrastructure crates
//! implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`AppId`, `ChannelId`, `StorageKey`, etc.) |
//! | [`types`] | Release-status value types |
//! | [`errors`] | Tagged error enumeration and retry hints |
//! | [`ports`] | Collaborator traits (provider, messaging, storage) |
//! | [`change`] | `should_notify` |
//! | [`blocks`] | Structured message blocks |
//! | [`view`] | Status rendering |

pub mod blocks;
pub mod change;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;
pub mod view;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use blocks::{Block, TextObject};
pub use change::should_notify;
pub use errors::{ProviderError, RetryPolicy, WatchError};
pub use identifiers::{AppId, ChannelId, CycleId, PhasedReleaseId, StorageKey, VersionId};
pub use ports::{KeyValueStore, MessageSink, ReleaseStatusSource};
pub use types::{
    AppStoreState, PhasedRelease, PhasedReleaseState, Platform, ReleaseStatus, ReleaseType,
    ReleaseVersion, TrackedApplication,
};
pub use view::StatusView;
