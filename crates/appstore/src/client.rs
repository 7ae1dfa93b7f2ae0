//! HTTP client for the release-management provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use tracker::{
    AppId, PhasedRelease, ProviderError, ReleaseStatus, ReleaseStatusSource, ReleaseVersion,
    VersionId, WatchError,
};

use crate::token::{Credential, TokenSigner};
use crate::wire::{provider_error, PhasedReleaseDocument, VersionList};

/// Default provider API root.
pub const DEFAULT_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// Connection settings for [`ReleaseStatusClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Headers that authenticate one or more provider requests.
///
/// Built once per [`ReleaseStatusClient::fetch_latest_status_with`] call and
/// shared by both of its requests, or supplied by a caller that manages its
/// own tokens.
#[derive(Clone)]
pub struct AuthHeaders(HeaderMap);

impl AuthHeaders {
    /// Standard bearer, `Accept` and `Content-Type` headers for `token`.
    pub fn bearer(token: &str) -> Result<Self, WatchError> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| WatchError::Signing {
                message: format!("token is not a valid header value: {e}"),
            })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self(headers))
    }

    /// Returns the underlying header map.
    pub fn as_header_map(&self) -> &HeaderMap {
        &self.0
    }
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // HeaderMap's Debug honours the sensitive flag on Authorization.
        f.debug_tuple("AuthHeaders").field(&self.0).finish()
    }
}

/// Fetches the latest store version and phased-rollout record of an application.
///
/// Performs no retries; every failure is returned to the caller as a
/// [`WatchError`].
pub struct ReleaseStatusClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
    signer: TokenSigner,
}

impl ReleaseStatusClient {
    /// Creates a client that signs tokens with `credential`.
    ///
    /// # Errors
    ///
    /// [`WatchError::Configuration`] if the HTTP client cannot be built.
    pub fn new(credential: Credential, config: ClientConfig) -> Result<Self, WatchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WatchError::Configuration {
                message: format!("failed to build provider HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
            signer: TokenSigner::new(),
        })
    }

    /// Signs a fresh token and wraps it in request headers.
    pub fn auth_headers(&self) -> Result<AuthHeaders, WatchError> {
        let token = self.signer.sign(&self.credential)?;
        AuthHeaders::bearer(token.as_str())
    }

    /// Fetches the latest status, reusing `auth` when given and signing a fresh
    /// token otherwise.
    #[instrument(skip(self, auth), fields(app_id = %app_id))]
    pub async fn fetch_latest_status_with(
        &self,
        app_id: &AppId,
        auth: Option<&AuthHeaders>,
    ) -> Result<ReleaseStatus, WatchError> {
        let signed;
        let auth = match auth {
            Some(headers) => headers,
            None => {
                signed = self.auth_headers()?;
                &signed
            }
        };

        let version = self.latest_version(app_id, auth).await?;
        let phased_release = self.phased_release(&version.id, auth).await?;

        debug!(
            version = %version.version_string,
            state = %version.app_store_state,
            phased = phased_release.is_some(),
            "Fetched release status"
        );

        Ok(ReleaseStatus {
            version,
            phased_release,
        })
    }

    /// Fetches the newest version record (`limit=1`; the provider lists newest first).
    ///
    /// # Errors
    ///
    /// [`WatchError::NoVersionFound`] if the application has no versions.
    pub async fn latest_version(
        &self,
        app_id: &AppId,
        auth: &AuthHeaders,
    ) -> Result<ReleaseVersion, WatchError> {
        let url = format!("{}/apps/{}/appStoreVersions", self.base_url, app_id);
        let list: VersionList = self.get_json(&url, &[("limit", "1")], auth).await?;

        let latest = list
            .data
            .into_iter()
            .next()
            .ok_or_else(|| WatchError::NoVersionFound {
                app_id: app_id.clone(),
            })?;
        Ok(latest.into_domain()?)
    }

    /// Fetches the phased-rollout record of a version.
    ///
    /// The provider answers "not found" when the version has no staged
    /// rollout; that is mapped to `Ok(None)`.
    pub async fn phased_release(
        &self,
        version_id: &VersionId,
        auth: &AuthHeaders,
    ) -> Result<Option<PhasedRelease>, WatchError> {
        let url = format!(
            "{}/appStoreVersions/{}/appStoreVersionPhasedRelease",
            self.base_url, version_id
        );

        let document: PhasedReleaseDocument = match self.get_json(&url, &[], auth).await {
            Ok(document) => document,
            Err(err) if err.status == Some(StatusCode::NOT_FOUND.as_u16()) => {
                debug!(version_id = %version_id, "No phased release configured");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        match document.data {
            Some(resource) => Ok(Some(resource.into_domain()?)),
            None => Ok(None),
        }
    }

    /// Sends a GET and decodes the body. Any non-2xx status becomes a
    /// [`ProviderError`] carrying the status code and raw payload.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        auth: &AuthHeaders,
    ) -> Result<T, ProviderError> {
        let mut request = self.http.get(url).headers(auth.as_header_map().clone());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError {
                message: format!("Request to provider failed: {e}"),
                status: e.status().map(|s| s.as_u16()),
                raw: None,
                retry_after_secs: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = error_from_response(response).await;
            debug!(
                url,
                status = status.as_u16(),
                message = %err.message,
                "Provider returned an error"
            );
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| ProviderError {
            message: format!("Malformed provider response: {e}"),
            status: Some(status.as_u16()),
            raw: None,
            retry_after_secs: None,
        })
    }
}

async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    provider_error(status, &body, retry_after)
}

#[async_trait]
impl ReleaseStatusSource for ReleaseStatusClient {
    async fn fetch_latest_status(&self, app_id: &AppId) -> Result<ReleaseStatus, WatchError> {
        self.fetch_latest_status_with(app_id, None).await
    }
}
