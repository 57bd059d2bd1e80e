//! Anti-forgery token acquisition.
//!
//! The carrier's token is short-lived and has no refresh endpoint, so it must
//! be pulled from a live authenticated context at the last possible moment
//! before the network call. The chain here is deterministic:
//!
//! 1. contexts showing the target domain, then two successive carrier-family
//!    pattern relaxations (first pattern with any matching context wins);
//! 2. each candidate context probed sequentially, first non-empty token wins;
//! 3. fall back to the previously stored token (possibly stale — the
//!    invalid-token retry in the tracking client covers that);
//!
//! Cookies are not subject to the same volatility and are refreshed
//! unconditionally from the host jar on every call.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;

use pulse_core::now_ms;
use pulse_core::records::{SessionPatch, SessionRecord};
use pulse_store::{SessionStore, StoreError};

use crate::context::{ContextProbe, CookieJar};
use crate::errors::FetchError;

/// Carrier-family pattern relaxations tried after the exact target domain.
const FAMILY_RELAXATIONS: [&str; 2] = ["https://www.amazon.*/*", "https://www.amazon.co.*/*"];

/// Token patterns for re-derivation from a fetched page, tried in order.
fn html_token_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r#"(?i)csrfToken\s*[:=]\s*["']([^"']+)["']"#,
            r#"(?i)["']csrfToken["']\s*[:=]\s*["']([^"']+)["']"#,
            r#"(?i)name="csrfToken"\s+value="([^"]+)""#,
            r#"(?i)value="([^"]+)"\s+name="csrfToken""#,
            r#"(?i)<meta[^>]+name="csrf-token"[^>]+content="([^"]+)""#,
            r#"(?i)CSRF_TOKEN\s*[:=]\s*["']([^"']+)["']"#,
            r#"(?i)csrf-token\s*[:=]\s*["']([^"']+)["']"#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
    })
}

/// Extract an anti-forgery token from raw page HTML.
///
/// First capture of the first matching pattern wins.
#[must_use]
pub fn extract_token_from_html(html: &str) -> Option<String> {
    for pattern in html_token_patterns() {
        if let Some(captures) = pattern.captures(html) {
            if let Some(token) = captures.get(1) {
                if !token.as_str().is_empty() {
                    return Some(token.as_str().to_string());
                }
            }
        }
    }
    None
}

/// Credentials resolved for one fetch.
///
/// `token` is `None` when no live or stored token could be found — a valid,
/// expected outcome that the tracking client turns into `NoCredentials`.
#[derive(Clone, Debug)]
pub struct ResolvedCredentials {
    /// Anti-forgery token, live if possible, else the stored fallback.
    pub token: Option<String>,
    /// Fresh header-formatted cookie set. Empty when the jar has none.
    pub cookie_header: String,
}

/// Obtains a token valid at the moment of use.
pub struct CredentialRefresher {
    sessions: Arc<SessionStore>,
    probe: Arc<dyn ContextProbe>,
    jar: Arc<dyn CookieJar>,
    http: reqwest::Client,
}

impl CredentialRefresher {
    /// Create a refresher over the given host interfaces.
    pub fn new(
        sessions: Arc<SessionStore>,
        probe: Arc<dyn ContextProbe>,
        jar: Arc<dyn CookieJar>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            sessions,
            probe,
            jar,
            http,
        }
    }

    /// Resolve a token and fresh cookies for `domain`.
    ///
    /// Never fails for "not found"; only a backing-store failure propagates.
    /// On a live capture the resolved pair is written back to the session
    /// store so the stored fallback stays as fresh as possible.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self, domain: &str) -> Result<ResolvedCredentials, StoreError> {
        let cookie_header = self.jar.cookie_header(domain).await;

        let live = self.live_token(domain).await;
        let token = match live {
            Some(token) => {
                let _ = self
                    .sessions
                    .put(
                        domain,
                        SessionPatch {
                            csrf_token: Some(token.clone()),
                            cookie_header: (!cookie_header.is_empty())
                                .then(|| cookie_header.clone()),
                            captured_at: Some(now_ms()),
                            ..SessionPatch::default()
                        },
                    )
                    .await?;
                Some(token)
            }
            None => {
                let stored = self
                    .sessions
                    .get(domain)
                    .await?
                    .map(|record| record.csrf_token)
                    .filter(|token| !token.is_empty());
                if stored.is_some() {
                    tracing::debug!(domain, "no live token, falling back to stored token");
                }
                stored
            }
        };

        Ok(ResolvedCredentials {
            token,
            cookie_header,
        })
    }

    /// Probe reachable authenticated contexts for a live token.
    ///
    /// The candidate list comes from the first pattern that matches any
    /// context; candidates are probed sequentially and the first non-empty
    /// token short-circuits the scan.
    async fn live_token(&self, domain: &str) -> Option<String> {
        let exact = format!("https://{domain}/*");
        let mut candidates = Vec::new();
        for pattern in std::iter::once(exact.as_str()).chain(FAMILY_RELAXATIONS) {
            candidates = self.probe.contexts_matching(pattern).await;
            if !candidates.is_empty() {
                break;
            }
        }

        if candidates.is_empty() {
            tracing::debug!(domain, "no authenticated contexts reachable");
            return None;
        }

        for context in &candidates {
            if let Some(token) = self.probe.extract_token(context).await {
                if !token.is_empty() {
                    tracing::debug!(url = %context.url, "live token extracted");
                    return Some(token);
                }
            }
        }

        tracing::debug!(
            domain,
            contexts = candidates.len(),
            "no token found in reachable contexts"
        );
        None
    }

    /// Force a full refresh for `domain`: fresh cookies plus token
    /// re-derivation from the record's capture source page.
    ///
    /// Used by the explicit user-triggered refresh path and as the forced
    /// re-acquisition step of the invalid-token retry. The page fetch is
    /// best-effort: if it fails or yields no token, the cookie refresh still
    /// stands.
    #[tracing::instrument(skip(self))]
    pub async fn force_refresh(&self, domain: &str) -> Result<SessionRecord, FetchError> {
        let Some(session) = self.sessions.get(domain).await? else {
            return Err(FetchError::NoCredentials {
                domain: domain.to_string(),
            });
        };

        let cookie_header = self.jar.cookie_header(domain).await;
        if cookie_header.is_empty() {
            return Err(FetchError::NoCredentials {
                domain: domain.to_string(),
            });
        }

        let mut record = self
            .sessions
            .put(
                domain,
                SessionPatch {
                    cookie_header: Some(cookie_header.clone()),
                    ..SessionPatch::default()
                },
            )
            .await?;

        if !session.source_url.is_empty() {
            match self.fetch_token_from_page(&session.source_url, &cookie_header).await {
                Some(token) => {
                    record = self
                        .sessions
                        .put(
                            domain,
                            SessionPatch {
                                csrf_token: Some(token),
                                captured_at: Some(now_ms()),
                                ..SessionPatch::default()
                            },
                        )
                        .await?;
                    tracing::info!(domain, "token re-derived from source page");
                }
                None => {
                    tracing::warn!(domain, "token re-derivation from source page failed");
                }
            }
        }

        Ok(record)
    }

    async fn fetch_token_from_page(&self, source_url: &str, cookie_header: &str) -> Option<String> {
        let response = self
            .http
            .get(source_url)
            .header(reqwest::header::COOKIE, cookie_header)
            .send()
            .await
            .ok()?;
        let html = response.text().await.ok()?;
        extract_token_from_html(&html)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
