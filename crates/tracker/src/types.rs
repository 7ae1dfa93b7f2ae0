//! Release-status value types.
//!
//! These mirror the subset of the provider's resource model the tracker cares
//! about. [`ReleaseStatus`] is the unit of comparison and persistence: one
//! instance per tracked application, fetched fresh each cycle and stored as JSON
//! under [`crate::StorageKey::for_status`].
//!
//! Provider enumerations serialise using the provider's SCREAMING_SNAKE_CASE
//! wire spelling. Values this crate does not know are preserved verbatim in an
//! `Other` variant so that a new provider state never breaks deserialisation of
//! either a fresh response or a persisted baseline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppId, PhasedReleaseId, VersionId};

// ---------------------------------------------------------------------------
// Macro for provider string enumerations.
// Generates: enum with an Other(String) fallback, as_str(), From<String>,
// Into<String>, Display. Serde goes through the String conversions.
// ---------------------------------------------------------------------------
macro_rules! wire_enum {
    (
        $(#[$attr:meta])*
        $name:ident {
            $(
                $(#[$vattr:meta])*
                $variant:ident => $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $(
                $(#[$vattr])*
                $variant,
            )+
            /// A value reported by the provider that is not modelled here.
            Other(String),
        }

        impl $name {
            /// Returns the provider's wire spelling of this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(raw) => raw.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(raw),
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::from(raw.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Provider enumerations
// ---------------------------------------------------------------------------

wire_enum! {
    /// Review and sale state of a store version.
    AppStoreState {
        PrepareForSubmission => "PREPARE_FOR_SUBMISSION",
        Processing => "PROCESSING",
        WaitingForReview => "WAITING_FOR_REVIEW",
        InReview => "IN_REVIEW",
        PendingDeveloperRelease => "PENDING_DEVELOPER_RELEASE",
        ReadyForSale => "READY_FOR_SALE",
        Rejected => "REJECTED",
    }
}

wire_enum! {
    /// State of a version's 7-day staged rollout.
    PhasedReleaseState {
        Inactive => "INACTIVE",
        Active => "ACTIVE",
        Paused => "PAUSED",
        Complete => "COMPLETE",
    }
}

wire_enum! {
    /// Target platform of a store version.
    Platform {
        Ios => "IOS",
        MacOs => "MAC_OS",
        TvOs => "TV_OS",
        VisionOs => "VISION_OS",
    }
}

wire_enum! {
    /// How a version is released once approved.
    ReleaseType {
        Manual => "MANUAL",
        AfterApproval => "AFTER_APPROVAL",
        Scheduled => "SCHEDULED",
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The most recent store version of an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseVersion {
    /// Provider-issued version record id.
    pub id: VersionId,

    /// Platform the version targets.
    pub platform: Platform,

    /// Marketing version string (e.g. `"2.1"`).
    pub version_string: String,

    /// Review/sale state.
    pub app_store_state: AppStoreState,

    /// Release mode; `None` when the provider omits it.
    #[serde(default)]
    pub release_type: Option<ReleaseType>,

    /// Earliest scheduled release date, for [`ReleaseType::Scheduled`] versions.
    #[serde(default)]
    pub earliest_release_date: Option<DateTime<Utc>>,

    /// When the version record was created.
    pub created_date: DateTime<Utc>,
}

/// A staged rollout attached to a store version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasedRelease {
    /// Provider-issued phased-release record id.
    pub id: PhasedReleaseId,

    /// Rollout state.
    pub state: PhasedReleaseState,

    /// When the rollout started; absent before the version goes live.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// Current day of the 7-day schedule (1–7).
    #[serde(default)]
    pub current_day_number: Option<u8>,

    /// Fraction of users the provider reports as receiving the update.
    #[serde(default)]
    pub customer_fraction: Option<f64>,

    /// Accumulated pause time, in days.
    #[serde(default)]
    pub total_pause_duration: Option<u32>,
}

/// Latest version plus its phased rollout, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseStatus {
    /// The latest store version.
    pub version: ReleaseVersion,

    /// The version's staged rollout. `None` when no phased release is configured.
    pub phased_release: Option<PhasedRelease>,
}

impl ReleaseStatus {
    /// Returns `true` if a phased-rollout record is attached.
    pub fn has_phased_release(&self) -> bool {
        self.phased_release.is_some()
    }
}

// ---------------------------------------------------------------------------
// Configuration-supplied values
// ---------------------------------------------------------------------------

/// One application configured for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedApplication {
    /// Human-readable name used in notification headers.
    pub display_name: String,

    /// Provider application id.
    pub app_id: AppId,
}

impl TrackedApplication {
    /// Creates a tracked application entry.
    pub fn new(display_name: impl Into<String>, app_id: AppId) -> Self {
        Self {
            display_name: display_name.into(),
            app_id,
        }
    }
}
