//! JSON:API documents returned by the provider, and their mapping onto the
//! tracker's domain types.
//!
//! Only the attributes the tracker uses are modelled; everything else in the
//! provider's payload is ignored during deserialisation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracker::{
    AppStoreState, PhasedRelease, PhasedReleaseId, PhasedReleaseState, Platform, ProviderError,
    ReleaseType, ReleaseVersion, VersionId,
};

/// Top-level `{"data": ...}` document.
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

/// A single JSON:API resource object.
#[derive(Debug, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: A,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionAttributes {
    pub platform: Platform,
    pub version_string: String,
    pub app_store_state: AppStoreState,
    #[serde(default)]
    pub release_type: Option<ReleaseType>,
    #[serde(default)]
    pub earliest_release_date: Option<String>,
    pub created_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasedReleaseAttributes {
    pub phased_release_state: PhasedReleaseState,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub total_pause_duration: Option<u32>,
    #[serde(default)]
    pub current_day_number: Option<u8>,
    #[serde(default)]
    pub customer_fraction: Option<f64>,
}

pub type VersionList = Document<Vec<Resource<VersionAttributes>>>;
pub type PhasedReleaseDocument = Document<Option<Resource<PhasedReleaseAttributes>>>;

// ---------------------------------------------------------------------------
// Error documents
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorResponse {
    /// Message of the first error: its `detail`, else its `title`.
    pub fn message(&self) -> String {
        match self.errors.first() {
            Some(first) => non_empty(&first.detail)
                .or_else(|| non_empty(&first.title))
                .unwrap_or("App Store Connect API Error")
                .to_string(),
            None => ProviderError::GENERIC_MESSAGE.to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|m| !m.is_empty())
}

/// Builds a [`ProviderError`] from a non-2xx response body.
pub fn provider_error(status: u16, body: &str, retry_after_secs: Option<u64>) -> ProviderError {
    let raw: Option<serde_json::Value> = if body.trim().is_empty() {
        None
    } else {
        Some(
            serde_json::from_str(body)
                .unwrap_or_else(|_| serde_json::Value::String(body.to_string())),
        )
    };

    let message = raw
        .as_ref()
        .and_then(|value| ErrorResponse::deserialize(value).ok())
        .map(|response| response.message())
        .unwrap_or_else(|| ProviderError::GENERIC_MESSAGE.to_string());

    ProviderError {
        message,
        status: Some(status),
        raw,
        retry_after_secs,
    }
}

// ---------------------------------------------------------------------------
// Domain mapping
// ---------------------------------------------------------------------------

impl Resource<VersionAttributes> {
    pub fn into_domain(self) -> Result<ReleaseVersion, ProviderError> {
        let id = VersionId::new(self.id).ok_or_else(|| malformed("version id is empty"))?;
        let created_date = parse_date(&self.attributes.created_date)
            .ok_or_else(|| malformed("version createdDate is not a date"))?;

        Ok(ReleaseVersion {
            id,
            platform: self.attributes.platform,
            version_string: self.attributes.version_string,
            app_store_state: self.attributes.app_store_state,
            release_type: self.attributes.release_type,
            earliest_release_date: self
                .attributes
                .earliest_release_date
                .as_deref()
                .and_then(parse_date),
            created_date,
        })
    }
}

impl Resource<PhasedReleaseAttributes> {
    pub fn into_domain(self) -> Result<PhasedRelease, ProviderError> {
        let id =
            PhasedReleaseId::new(self.id).ok_or_else(|| malformed("phased release id is empty"))?;

        Ok(PhasedRelease {
            id,
            state: self.attributes.phased_release_state,
            start_date: self.attributes.start_date.as_deref().and_then(parse_date),
            current_day_number: self.attributes.current_day_number,
            customer_fraction: self.attributes.customer_fraction,
            total_pause_duration: self.attributes.total_pause_duration,
        })
    }
}

fn malformed(what: &str) -> ProviderError {
    ProviderError {
        message: format!("Malformed provider response: {what}"),
        status: None,
        raw: None,
        retry_after_secs: None,
    }
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date at midnight UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_detail_then_title() {
        let err = provider_error(
            401,
            r#"{"errors":[{"status":"401","code":"NOT_AUTHORIZED","title":"Authentication credentials are missing or invalid.","detail":"Provide a properly configured and signed bearer token."}]}"#,
            None,
        );
        assert_eq!(
            err.message,
            "Provide a properly configured and signed bearer token."
        );
        assert_eq!(err.status, Some(401));
        assert!(err.raw.is_some());

        let err = provider_error(403, r#"{"errors":[{"title":"Forbidden"}]}"#, None);
        assert_eq!(err.message, "Forbidden");
    }

    #[test]
    fn empty_detail_falls_through_to_title() {
        let err = provider_error(
            409,
            r#"{"errors":[{"title":"Conflict title","detail":""}]}"#,
            None,
        );
        assert_eq!(err.message, "Conflict title");

        let err = provider_error(409, r#"{"errors":[{"title":"","detail":""}]}"#, None);
        assert_eq!(err.message, "App Store Connect API Error");
    }

    #[test]
    fn error_message_falls_back_to_generic() {
        assert_eq!(
            provider_error(502, "", None).message,
            ProviderError::GENERIC_MESSAGE
        );
        let html = provider_error(502, "<html>bad gateway</html>", Some(10));
        assert_eq!(html.message, ProviderError::GENERIC_MESSAGE);
        assert_eq!(html.raw, Some(json!("<html>bad gateway</html>")));
        assert_eq!(html.retry_after_secs, Some(10));
    }

    #[test]
    fn dates_accept_offsets_and_bare_days() {
        assert_eq!(
            parse_date("2024-05-01T10:00:00-07:00"),
            Some("2024-05-01T17:00:00Z".parse().unwrap())
        );
        assert_eq!(
            parse_date("2024-05-02"),
            Some("2024-05-02T00:00:00Z".parse().unwrap())
        );
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn version_resource_maps_onto_domain() {
        let list: VersionList = serde_json::from_value(json!({
            "data": [{
                "type": "appStoreVersions",
                "id": "ver-1",
                "attributes": {
                    "platform": "IOS",
                    "versionString": "2.1",
                    "appStoreState": "READY_FOR_SALE",
                    "releaseType": "AFTER_APPROVAL",
                    "downloadable": true,
                    "createdDate": "2024-05-01T10:00:00-07:00"
                }
            }]
        }))
        .unwrap();

        let version = list.data.into_iter().next().unwrap().into_domain().unwrap();
        assert_eq!(version.version_string, "2.1");
        assert_eq!(version.app_store_state, AppStoreState::ReadyForSale);
        assert_eq!(version.release_type, Some(ReleaseType::AfterApproval));
        assert_eq!(version.earliest_release_date, None);
    }
}
