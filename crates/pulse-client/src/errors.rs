//! Fetch error taxonomy.
//!
//! Only conditions the caller must react to are errors. "Token not found"
//! inside the credential refresher is an expected outcome (a `None`), and
//! "no GPS data yet" is an informational record, not a failure.

use pulse_store::StoreError;

/// Errors raised by the tracking client and normalizer.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No cookies and/or no token obtainable for the target domain.
    ///
    /// User-visible: the fix is re-establishing an authenticated context.
    #[error("no usable credentials for {domain}: sign in to the carrier site and retry")]
    NoCredentials {
        /// Domain the credentials were needed for.
        domain: String,
    },

    /// The server rejected the anti-forgery token, and the single retry with
    /// freshly acquired credentials was also rejected.
    #[error("carrier rejected the request token for {domain}, try again")]
    InvalidToken {
        /// Domain that rejected the token.
        domain: String,
    },

    /// Transport failure (including timeouts). Not retried within the cycle;
    /// the next scheduled poll is the retry mechanism.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not decodable as the expected JSON shape.
    #[error("malformed carrier response: {0}")]
    Malformed(String),

    /// The backing session store failed.
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl FetchError {
    /// Whether this error instructs the user to re-establish a signed-in
    /// carrier context.
    #[must_use]
    pub fn needs_user_action(&self) -> bool {
        matches!(
            self,
            Self::NoCredentials { .. } | Self::InvalidToken { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
