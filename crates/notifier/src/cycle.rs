//! One polling cycle over the tracked applications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};
use tracker::{
    should_notify, ChannelId, CycleId, KeyValueStore, MessageSink, ReleaseStatus,
    ReleaseStatusSource, StatusView, StorageKey, TrackedApplication, WatchError,
};

/// Default number of applications processed concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Static settings of a [`ChangeNotifier`].
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Destination every notification is posted to.
    pub channel: ChannelId,

    /// Upper bound on applications processed at the same time.
    pub max_concurrency: usize,

    /// Renderer used for notification messages.
    pub view: StatusView,
}

impl NotifierConfig {
    /// Settings with the default concurrency and a UTC view.
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            view: StatusView::default(),
        }
    }
}

/// Whether a cycle applies change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleMode {
    /// Notify only when [`should_notify`] reports a material change.
    #[default]
    OnChange,
    /// Notify for every successfully fetched application.
    Always,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened to the notification for one application.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// No material change was detected.
    NotRequired,
    /// The message was accepted by the messaging service.
    Sent,
    /// The messaging service rejected the message. The new status was still
    /// persisted, so this change will not be re-announced by a later cycle.
    Failed(WatchError),
}

/// Per-application result of a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AppOutcome {
    /// The status could not be fetched or the stored baseline could not be
    /// read. Nothing was sent and nothing was persisted.
    Skipped(WatchError),
    /// The status was fetched and compared.
    Processed {
        /// Notification result.
        notification: Notification,
        /// Set when writing the new baseline failed.
        persist_error: Option<WatchError>,
    },
}

/// Result for one tracked application.
#[derive(Debug, Clone, PartialEq)]
pub struct AppReport {
    /// Application the report is for.
    pub app: TrackedApplication,
    /// What happened to it.
    pub outcome: AppOutcome,
}

impl AppReport {
    /// Returns `true` if a message was delivered for this application.
    pub fn notified(&self) -> bool {
        matches!(
            self.outcome,
            AppOutcome::Processed {
                notification: Notification::Sent,
                ..
            }
        )
    }

    /// Every error recorded for this application.
    pub fn errors(&self) -> Vec<&WatchError> {
        match &self.outcome {
            AppOutcome::Skipped(err) => vec![err],
            AppOutcome::Processed {
                notification,
                persist_error,
            } => {
                let mut errors = Vec::new();
                if let Notification::Failed(err) = notification {
                    errors.push(err);
                }
                errors.extend(persist_error.iter());
                errors
            }
        }
    }
}

/// Summary of one cycle. Report order does not follow configuration order.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Identifier recorded on the cycle span.
    pub cycle_id: CycleId,
    /// When the cycle began.
    pub started_at: DateTime<Utc>,
    /// When the last application finished.
    pub finished_at: DateTime<Utc>,
    /// One entry per tracked application, in completion order.
    pub reports: Vec<AppReport>,
}

/// Counts used for the end-of-cycle log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounts {
    /// Applications whose message was delivered.
    pub notified: usize,
    /// Applications with no material change.
    pub unchanged: usize,
    /// Applications skipped before comparison.
    pub skipped: usize,
    /// Applications that recorded at least one error.
    pub failed: usize,
}

impl CycleReport {
    /// Report for `app_id`, if it was part of the cycle.
    pub fn get(&self, app_id: &tracker::AppId) -> Option<&AppReport> {
        self.reports.iter().find(|r| &r.app.app_id == app_id)
    }

    /// Aggregated counts.
    pub fn counts(&self) -> CycleCounts {
        let mut counts = CycleCounts::default();
        for report in &self.reports {
            match &report.outcome {
                AppOutcome::Skipped(_) => counts.skipped += 1,
                AppOutcome::Processed { notification, .. } => match notification {
                    Notification::Sent => counts.notified += 1,
                    Notification::NotRequired => counts.unchanged += 1,
                    Notification::Failed(_) => {}
                },
            }
            if !report.errors().is_empty() {
                counts.failed += 1;
            }
        }
        counts
    }

    /// Returns `true` if no application recorded an error.
    pub fn is_clean(&self) -> bool {
        self.reports.iter().all(|r| r.errors().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Runs polling cycles: fetch, compare against the stored baseline, notify on
/// material change, then persist the fetched status unconditionally.
///
/// Each application is processed independently; a failure for one never
/// blocks the others. Nothing is retried. Persistence always follows a
/// successful fetch, even when the notification was not delivered, so the
/// baseline tracks the last *fetched* status rather than the last *notified*
/// one.
pub struct ChangeNotifier {
    source: Arc<dyn ReleaseStatusSource>,
    sink: Arc<dyn MessageSink>,
    store: Arc<dyn KeyValueStore>,
    config: NotifierConfig,
}

impl ChangeNotifier {
    /// Creates a notifier from its collaborators.
    pub fn new(
        source: Arc<dyn ReleaseStatusSource>,
        sink: Arc<dyn MessageSink>,
        store: Arc<dyn KeyValueStore>,
        config: NotifierConfig,
    ) -> Self {
        Self {
            source,
            sink,
            store,
            config,
        }
    }

    /// Runs one cycle over `apps`.
    ///
    /// Never fails as a whole: per-application failures are logged and
    /// returned in the [`CycleReport`].
    #[tracing::instrument(
        name = "cycle",
        skip(self, apps),
        fields(cycle_id = field::Empty, apps = apps.len(), mode = ?mode)
    )]
    pub async fn run_cycle(&self, apps: &[TrackedApplication], mode: CycleMode) -> CycleReport {
        let cycle_id = CycleId::new_random();
        Span::current().record("cycle_id", field::display(cycle_id));
        let started_at = Utc::now();
        info!("Cycle started");

        let reports: Vec<AppReport> = stream::iter(apps.iter().cloned())
            .map(|app| self.process(app, mode))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let report = CycleReport {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            reports,
        };

        let counts = report.counts();
        info!(
            notified = counts.notified,
            unchanged = counts.unchanged,
            skipped = counts.skipped,
            failed = counts.failed,
            "Cycle finished"
        );
        report
    }

    async fn process(&self, app: TrackedApplication, mode: CycleMode) -> AppReport {
        let span = info_span!("app", app_id = %app.app_id, name = %app.display_name);
        let outcome = self.process_inner(&app, mode).instrument(span).await;
        AppReport { app, outcome }
    }

    async fn process_inner(&self, app: &TrackedApplication, mode: CycleMode) -> AppOutcome {
        let current = match self.source.fetch_latest_status(&app.app_id).await {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    kind = err.kind(),
                    status = ?err.status(),
                    retry = ?err.retry_policy(),
                    error = %err,
                    "Fetching release status failed; skipping app"
                );
                return AppOutcome::Skipped(err);
            }
        };

        let key = StorageKey::for_status(&app.app_id);
        let previous = match self.load_baseline(&key).await {
            Ok(previous) => previous,
            Err(err) => {
                error!(key = %key, error = %err, "Reading stored status failed; skipping app");
                return AppOutcome::Skipped(err);
            }
        };

        let changed = should_notify(previous.as_ref(), &current);
        debug!(
            first_observation = previous.is_none(),
            changed,
            version = %current.version.version_string,
            state = %current.version.app_store_state,
            "Compared release status"
        );

        let notification = if changed || mode == CycleMode::Always {
            self.notify(app, &current).await
        } else {
            Notification::NotRequired
        };

        let persist_error = self.persist(&key, &current).await.err();
        if let Some(err) = &persist_error {
            error!(key = %key, error = %err, "Persisting release status failed");
        }

        AppOutcome::Processed {
            notification,
            persist_error,
        }
    }

    async fn load_baseline(&self, key: &StorageKey) -> Result<Option<ReleaseStatus>, WatchError> {
        let Some(json) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(status) => Ok(Some(status)),
            Err(err) => {
                warn!(
                    key = %key,
                    error = %err,
                    "Stored status is unreadable; treating as first observation"
                );
                Ok(None)
            }
        }
    }

    async fn notify(&self, app: &TrackedApplication, status: &ReleaseStatus) -> Notification {
        let blocks = self
            .config
            .view
            .render_notification(&app.display_name, status, Utc::now());

        match self.sink.post_message(&self.config.channel, &blocks).await {
            Ok(()) => {
                info!(channel = %self.config.channel, "Status change notified");
                Notification::Sent
            }
            Err(err) => {
                error!(
                    channel = %self.config.channel,
                    error = %err,
                    "Notification delivery failed; status will still be persisted"
                );
                Notification::Failed(err)
            }
        }
    }

    async fn persist(&self, key: &StorageKey, status: &ReleaseStatus) -> Result<(), WatchError> {
        let json = serde_json::to_string(status).map_err(|e| WatchError::Storage {
            key: key.to_string(),
            message: format!("status could not be serialised: {e}"),
        })?;
        self.store.put(key, json).await
    }
}
