//! Cron trigger for polling cycles.
//!
//! [`CronTrigger`] evaluates a cron expression in a fixed reference offset and
//! invokes a handler at every fire time until shutdown is requested.
//!
//! Both the classic five-field form (`*/10 * * * *`) and the six/seven-field
//! form with a leading seconds field are accepted. Five-field expressions fire
//! at second zero.
//!
//! The handler is awaited inline. A tick that falls due while the previous
//! handler is still running is skipped, never queued, so at most one cycle is
//! in flight at any time.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Knows nothing about what the handler does.

use std::future::Future;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use tracing::{debug, info, warn};

/// Default polling schedule: every ten minutes.
pub const DEFAULT_CRON: &str = "*/10 * * * *";

/// Errors raised while building a trigger.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    #[error("Cron expression '{expression}' never fires")]
    NeverFires { expression: String },
}

/// Fires a handler according to a cron expression.
#[derive(Debug, Clone)]
pub struct CronTrigger {
    expression: String,
    schedule: Schedule,
    zone: FixedOffset,
}

impl CronTrigger {
    /// Parses `expression`, evaluated in `zone`.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidExpression`] if the expression cannot be parsed.
    /// [`ScheduleError::NeverFires`] if it has no future fire time.
    pub fn new(expression: &str, zone: FixedOffset) -> Result<Self, ScheduleError> {
        let normalized = normalize(expression);
        let schedule =
            Schedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidExpression {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;

        let trigger = Self {
            expression: expression.trim().to_string(),
            schedule,
            zone,
        };
        if trigger.next_fire_after(Utc::now()).is_none() {
            return Err(ScheduleError::NeverFires {
                expression: trigger.expression,
            });
        }
        Ok(trigger)
    }

    /// The expression as configured.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Reference offset the expression is evaluated in.
    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    /// First fire time strictly after `after`.
    pub fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&self.zone))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Invokes `handler` at every fire time until `shutdown` resolves.
    ///
    /// Returns the number of ticks the handler ran for. A running handler is
    /// allowed to finish before shutdown is observed.
    pub async fn run<F, Fut, S>(&self, mut handler: F, shutdown: S) -> u64
    where
        F: FnMut(DateTime<Utc>) -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut fired = 0u64;
        info!(cron = %self.expression, zone = %self.zone, "Scheduler started");

        loop {
            let now = Utc::now();
            let Some(next) = self.next_fire_after(now) else {
                warn!(cron = %self.expression, "Schedule has no further fire times");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(next = %next, wait_secs = wait.as_secs(), "Waiting for next tick");

            tokio::select! {
                _ = &mut shutdown => {
                    info!(ticks = fired, "Scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            handler(next).await;
            fired += 1;

            let finished = Utc::now();
            if let Some(missed) = self.next_fire_after(next).filter(|at| *at <= finished) {
                warn!(
                    scheduled = %missed,
                    "Cycle overran the next tick; skipping overlapped ticks"
                );
            }
        }

        fired
    }
}

/// Prepends a seconds field to five-field expressions.
fn normalize(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}
