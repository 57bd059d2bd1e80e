//! The tracking-fetch protocol.
//!
//! One fetch: resolve the target domain, pull credentials at the last moment,
//! persist the resolved pair, POST the form-encoded tracking request, and
//! return the raw decoded payload. Normalization is the caller's step; the
//! bounded invalid-token retry lives in [`TrackingClient::fetch_record`] so
//! the whole recovery policy is auditable in one place.

use std::sync::Arc;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde_json::Value;

use pulse_core::records::SessionPatch;
use pulse_core::records::TrackingRecord;
use pulse_store::SessionStore;

use crate::credentials::CredentialRefresher;
use crate::errors::FetchError;
use crate::normalize::{Normalized, normalize};

/// Fixed carrier endpoint path for map-tracking lookups.
const TRACKING_PATH: &str = "/progress-tracker/package/actions/map-tracking-deans-proxy";

/// Content type the carrier endpoint expects.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Tracking client configuration.
#[derive(Clone, Debug)]
pub struct TrackingConfig {
    /// Domain used when no argument is given and no session is stored.
    pub default_domain: String,
    /// Overrides `https://<domain>` as the request origin. Test hook.
    pub origin_override: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            default_domain: "www.amazon.it".to_string(),
            origin_override: None,
        }
    }
}

/// Retry phases of one `fetch_record` call.
///
/// Kept as an explicit state rather than recursion so the single-retry bound
/// is static.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchPhase {
    Fetching,
    RetryingWithFreshToken,
}

/// Issues tracking requests against the private carrier API.
pub struct TrackingClient {
    sessions: Arc<SessionStore>,
    refresher: CredentialRefresher,
    http: reqwest::Client,
    config: TrackingConfig,
}

impl TrackingClient {
    /// Create a client over the given session store and refresher.
    pub fn new(
        sessions: Arc<SessionStore>,
        refresher: CredentialRefresher,
        http: reqwest::Client,
        config: TrackingConfig,
    ) -> Self {
        Self {
            sessions,
            refresher,
            http,
            config,
        }
    }

    /// Resolve the target domain: explicit argument, else the most recently
    /// updated stored session, else the configured default.
    pub async fn resolve_domain(&self, domain: Option<&str>) -> Result<String, FetchError> {
        if let Some(domain) = domain {
            return Ok(domain.to_string());
        }
        if let Some(session) = self.sessions.most_recent().await? {
            return Ok(session.domain);
        }
        Ok(self.config.default_domain.clone())
    }

    /// Fetch the raw tracking payload for `tracking_id` from `domain`.
    ///
    /// Returns the decoded payload verbatim; classification and
    /// normalization are the caller's job.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_raw(&self, tracking_id: &str, domain: &str) -> Result<Value, FetchError> {
        let creds = self.refresher.refresh(domain).await?;
        if creds.cookie_header.is_empty() {
            return Err(FetchError::NoCredentials {
                domain: domain.to_string(),
            });
        }
        let Some(token) = creds.token else {
            return Err(FetchError::NoCredentials {
                domain: domain.to_string(),
            });
        };

        // Persist the resolved pair so the stored fallback tracks reality.
        let _ = self
            .sessions
            .put(
                domain,
                SessionPatch {
                    csrf_token: Some(token.clone()),
                    cookie_header: Some(creds.cookie_header.clone()),
                    ..SessionPatch::default()
                },
            )
            .await?;

        let url = format!("{}{TRACKING_PATH}", self.origin(domain));
        let body = format!(
            "trackingId={}&csrfToken={}",
            utf8_percent_encode(tracking_id, NON_ALPHANUMERIC),
            utf8_percent_encode(&token, NON_ALPHANUMERIC),
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(COOKIE, creds.cookie_header)
            .body(body)
            .send()
            .await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(tracking_id, "undecodable tracking response: {e}");
            FetchError::Malformed(e.to_string())
        })
    }

    /// Fetch and normalize, with the bounded invalid-token recovery.
    ///
    /// On an `INVALID_TOKEN` classification the client forces one fresh
    /// credential acquisition and retries exactly once; a second rejection
    /// surfaces as [`FetchError::InvalidToken`].
    #[tracing::instrument(skip(self))]
    pub async fn fetch_record(
        &self,
        tracking_id: &str,
        domain: Option<&str>,
    ) -> Result<TrackingRecord, FetchError> {
        let domain = self.resolve_domain(domain).await?;
        let mut phase = FetchPhase::Fetching;

        loop {
            let raw = self.fetch_raw(tracking_id, &domain).await?;
            match normalize(tracking_id, &raw) {
                Normalized::Record(mut record) => {
                    record.domain = Some(domain);
                    return Ok(record);
                }
                Normalized::InvalidToken => match phase {
                    FetchPhase::Fetching => {
                        tracing::info!(tracking_id, domain, "token rejected, retrying once");
                        // Best-effort: even if the forced refresh fails, the
                        // retry itself re-resolves credentials.
                        if let Err(e) = self.refresher.force_refresh(&domain).await {
                            tracing::debug!(domain, "forced refresh failed: {e}");
                        }
                        phase = FetchPhase::RetryingWithFreshToken;
                    }
                    FetchPhase::RetryingWithFreshToken => {
                        return Err(FetchError::InvalidToken { domain });
                    }
                },
            }
        }
    }

    fn origin(&self, domain: &str) -> String {
        self.config
            .origin_override
            .clone()
            .unwrap_or_else(|| format!("https://{domain}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
