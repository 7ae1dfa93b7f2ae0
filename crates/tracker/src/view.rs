//! Rendering of a [`ReleaseStatus`] into message blocks.
//!
//! Rendering is pure: the caller supplies the render timestamp and the zone
//! dates are displayed in, so identical inputs always produce identical blocks.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::{AppStoreState, Block, PhasedReleaseState, ReleaseStatus, TextObject};

/// Number of segments in the rollout progress bar.
pub const PROGRESS_SEGMENTS: usize = 10;

const FILLED: char = '▰';
const EMPTY: char = '▱';

/// Share of users (in percent) that receive the update on each rollout day.
///
/// Fixed by the provider's 7-day schedule; any other day maps to 0.
pub fn rollout_percent(day: Option<u8>) -> u8 {
    match day {
        Some(1) => 1,
        Some(2) => 2,
        Some(3) => 5,
        Some(4) => 10,
        Some(5) => 20,
        Some(6) => 50,
        Some(7) => 100,
        _ => 0,
    }
}

/// Renders `percent` as a bar of [`PROGRESS_SEGMENTS`] segments, rounded to the
/// nearest segment (halves round up).
pub fn progress_bar(percent: u8) -> String {
    let fraction = f64::from(percent.min(100)) / 100.0;
    let filled = (fraction * PROGRESS_SEGMENTS as f64).round() as usize;
    let mut bar = String::with_capacity(PROGRESS_SEGMENTS * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(PROGRESS_SEGMENTS - filled));
    bar
}

/// Emoji shown next to the headline for each store state.
pub fn state_emoji(state: &AppStoreState) -> &'static str {
    match state {
        AppStoreState::PrepareForSubmission => "📝",
        AppStoreState::Processing => "⚙️",
        AppStoreState::WaitingForReview => "⏳",
        AppStoreState::InReview => "👀",
        AppStoreState::PendingDeveloperRelease => "🔜",
        AppStoreState::ReadyForSale => "✅",
        AppStoreState::Rejected => "❌",
        AppStoreState::Other(_) => "❓",
    }
}

/// Formats a timestamp as `M/D/YYYY, h:mm:ss AM` in `zone`.
pub fn format_timestamp(at: DateTime<Utc>, zone: FixedOffset) -> String {
    at.with_timezone(&zone)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Renders release statuses into message blocks.
#[derive(Debug, Clone, Copy)]
pub struct StatusView {
    zone: FixedOffset,
}

impl Default for StatusView {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl StatusView {
    /// Creates a view that displays dates in `zone`.
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    /// Renders `status` without an application header.
    ///
    /// Layout: headline with state emoji, version/state fields, divider, the
    /// phased-rollout blocks (only for a rollout that is not inactive), and a
    /// trailing "Last updated" context line stamped with `rendered_at`.
    pub fn render(&self, status: &ReleaseStatus, rendered_at: DateTime<Utc>) -> Vec<Block> {
        let version = &status.version;

        let mut blocks = vec![
            Block::text_section(TextObject::mrkdwn(format!(
                "*App Store Status Update* {}",
                state_emoji(&version.app_store_state)
            ))),
            Block::field_section(vec![
                TextObject::mrkdwn(format!("*Version:* `{}`", version.version_string)),
                TextObject::mrkdwn(format!("*Status:* `{}`", version.app_store_state)),
            ]),
            Block::Divider,
        ];

        if let Some(phase) = status
            .phased_release
            .as_ref()
            .filter(|p| p.state != PhasedReleaseState::Inactive)
        {
            let percent = rollout_percent(phase.current_day_number);
            let day = phase
                .current_day_number
                .map_or_else(|| "-".to_string(), |d| d.to_string());
            let start = phase
                .start_date
                .map_or_else(|| "Not started".to_string(), |d| format_timestamp(d, self.zone));

            blocks.push(Block::text_section(TextObject::mrkdwn(
                "*Phased Release Status*",
            )));
            blocks.push(Block::field_section(vec![
                TextObject::mrkdwn(format!("*Status:* `{}`", phase.state)),
                TextObject::mrkdwn(format!("*Day:* `{day}`")),
                TextObject::mrkdwn(format!("{} {percent}%", progress_bar(percent))),
                TextObject::mrkdwn(format!("*Start Date:* `{start}`")),
            ]));
        }

        blocks.push(Block::Context {
            elements: vec![TextObject::mrkdwn(format!(
                "Last updated: {}",
                format_timestamp(rendered_at, self.zone)
            ))],
        });

        blocks
    }

    /// Renders `status` prefixed with a header naming the application.
    pub fn render_notification(
        &self,
        display_name: &str,
        status: &ReleaseStatus,
        rendered_at: DateTime<Utc>,
    ) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(8);
        blocks.push(Block::Header {
            text: TextObject::plain(format!("{} App Status Update", capitalize(display_name))),
        });
        blocks.extend(self.render(status, rendered_at));
        blocks
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
