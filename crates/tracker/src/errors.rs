//! Error and retry-policy types for the release tracker.
//!
//! [`WatchError`] is a single tagged enumeration covering every failure the
//! tracker can observe: token signing, provider calls, message delivery and
//! persistence. Failures are returned as values through every call signature;
//! the cycle isolates them per application and never aborts on them.
//!
//! [`RetryPolicy`] is advisory. The tracker performs no retries itself; the hint
//! exists so an external scheduler can decide whether an earlier repeat cycle is
//! worthwhile.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppId, ChannelId};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt, derived from `Retry-After`
        /// when the provider sent one.
        after: Option<Duration>,
    },
    /// Retrying would produce the same failure.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Provider failures
// ---------------------------------------------------------------------------

/// A failed call to the release-management provider.
///
/// Produced for transport failures and for every non-2xx response other than
/// the "not found" answer for a missing phased-rollout record.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ProviderError {
    /// Human-readable message: the first structured error's `detail`, falling
    /// back to its `title`, falling back to a generic message.
    pub message: String,

    /// HTTP status code, when a response was received.
    pub status: Option<u16>,

    /// Raw error payload for diagnostics.
    pub raw: Option<serde_json::Value>,

    /// Value of the `Retry-After` header, in seconds, when present.
    #[serde(default)]
    pub retry_after_secs: Option<u64>,
}

impl ProviderError {
    /// Message used when the response carries no structured error detail.
    pub const GENERIC_MESSAGE: &'static str = "Unknown App Store Connect Error";

    /// Creates a provider error for a failure that never produced a response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            raw: None,
            retry_after_secs: None,
        }
    }

    /// Returns the advisory retry policy for this failure.
    ///
    /// Transport failures, `429` and `5xx` responses are retryable.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self.status {
            None => RetryPolicy::Retryable { after: None },
            Some(429) | Some(500..=599) => RetryPolicy::Retryable {
                after: self.retry_after_secs.map(Duration::from_secs),
            },
            Some(_) => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracker errors
// ---------------------------------------------------------------------------

/// Every failure the tracker reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WatchError {
    /// The configured private key is malformed or is not a P-256 signing key.
    #[error("Private key could not be imported: {message}")]
    KeyImport {
        /// Description of the import failure.
        message: String,
    },

    /// The signing operation itself failed.
    #[error("Token signing failed: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// The provider returned an empty version list for the application.
    #[error("No version found for app {app_id}")]
    NoVersionFound {
        /// The application that has no published versions.
        app_id: AppId,
    },

    /// The provider call failed.
    #[error("Provider request failed: {0}")]
    Provider(#[from] ProviderError),

    /// The messaging destination rejected the notification.
    #[error("Notification to {channel} was not delivered: {message}")]
    NotificationDelivery {
        /// Destination the message was addressed to.
        channel: ChannelId,
        /// Description reported by the messaging service.
        message: String,
        /// Raw response payload, when one was received.
        raw: Option<serde_json::Value>,
    },

    /// The key-value store could not be read or written.
    #[error("Storage failure for key '{key}': {message}")]
    Storage {
        /// Key being accessed.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// The runtime configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl WatchError {
    /// Short, stable label for the error variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyImport { .. } => "key_import",
            Self::Signing { .. } => "signing",
            Self::NoVersionFound { .. } => "no_version_found",
            Self::Provider(_) => "provider",
            Self::NotificationDelivery { .. } => "notification_delivery",
            Self::Storage { .. } => "storage",
            Self::Configuration { .. } => "configuration",
        }
    }

    /// HTTP status code carried by provider failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider(err) => err.status,
            _ => None,
        }
    }

    /// Returns the advisory retry policy for this failure.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Provider(err) => err.retry_policy(),
            Self::NotificationDelivery { .. } | Self::Storage { .. } => {
                RetryPolicy::Retryable { after: None }
            }
            Self::KeyImport { .. }
            | Self::Signing { .. }
            | Self::NoVersionFound { .. }
            | Self::Configuration { .. } => RetryPolicy::NonRetryable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(status: Option<u16>) -> ProviderError {
        ProviderError {
            message: "boom".to_string(),
            status,
            raw: None,
            retry_after_secs: Some(30),
        }
    }

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        assert_eq!(
            provider(Some(429)).retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(30))
            }
        );
        assert!(matches!(
            provider(Some(503)).retry_policy(),
            RetryPolicy::Retryable { .. }
        ));
        assert!(matches!(
            provider(None).retry_policy(),
            RetryPolicy::Retryable { after: None }
        ));
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert_eq!(provider(Some(401)).retry_policy(), RetryPolicy::NonRetryable);
        assert_eq!(provider(Some(404)).retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn missing_versions_are_not_retryable() {
        let err = WatchError::NoVersionFound {
            app_id: AppId::new("1").unwrap(),
        };
        assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);
        assert_eq!(err.kind(), "no_version_found");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn provider_errors_expose_their_status() {
        let err = WatchError::from(provider(Some(401)));
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Provider request failed: boom");
    }
}
