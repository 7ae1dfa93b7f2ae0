//! Key-value persistence adapters.
//!
//! Implements [`tracker::KeyValueStore`] with two backends:
//!
//! - [`FileStore`] keeps one file per key inside a state directory. Writes go
//!   to a temporary sibling file that is then renamed over the target, so a
//!   reader never observes a partially written value.
//! - [`InMemoryStore`] keeps values in a map. Used by tests and for dry runs
//!   where nothing should outlive the process.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The [`tracker`] crate sees only
//! [`tracker::KeyValueStore`]; value encoding is the caller's concern.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::InMemoryStore;
