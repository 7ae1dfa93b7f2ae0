//! Change-notification cycle.
//!
//! [`ChangeNotifier`] ties the three collaborator ports from `tracker`
//! together. One call to [`ChangeNotifier::run_cycle`] processes every tracked
//! application concurrently (bounded by [`NotifierConfig::max_concurrency`]):
//!
//! 1. fetch the latest status from the provider,
//! 2. load the previously persisted status,
//! 3. post a notification if [`tracker::should_notify`] reports a material change,
//! 4. persist the fetched status.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Depends only on `tracker` ports; the binary supplies the
//! concrete adapters.

pub mod cycle;

pub use cycle::{
    AppOutcome, AppReport, ChangeNotifier, CycleCounts, CycleMode, CycleReport, Notification,
    NotifierConfig, DEFAULT_MAX_CONCURRENCY,
};
