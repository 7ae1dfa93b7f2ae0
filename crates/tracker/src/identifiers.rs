//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! an [`AppId`] with a [`VersionId`] even though both are strings issued by the
//! provider.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: provider-issued
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies an application in the release-management provider.
    ///
    /// This is the numeric store identifier (e.g. `"1487761617"`), kept as a
    /// string because the provider treats it as an opaque resource id.
    AppId
}

string_id! {
    /// Identifies one store version record of an application.
    VersionId
}

string_id! {
    /// Identifies the phased-rollout record attached to a store version.
    PhasedReleaseId
}

// ---------------------------------------------------------------------------
// Identifiers: configuration
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies the messaging destination notifications are posted to.
    ChannelId
}

string_id! {
    /// A key in the external key-value store.
    StorageKey
}

impl StorageKey {
    /// Prefix of every persisted release-status key.
    pub const STATUS_PREFIX: &'static str = "lastStatus_";

    /// Returns the key under which the last fetched status of `app_id` is kept.
    ///
    /// The mapping is deterministic: `lastStatus_<applicationId>`.
    pub fn for_status(app_id: &AppId) -> Self {
        Self(format!("{}{}", Self::STATUS_PREFIX, app_id.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single polling cycle.
///
/// Generated fresh for every scheduler tick; attached to the cycle span so all
/// activity from one cycle can be correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(Uuid);

impl CycleId {
    /// Generates a new random cycle identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
