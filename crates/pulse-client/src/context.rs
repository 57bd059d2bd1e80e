//! Consumed host interfaces for credential capture.
//!
//! The host environment owns the authenticated browsing contexts and the
//! cookie jar; the core only drives them through these two traits. Both are
//! best-effort by contract: an empty result is an expected outcome, never an
//! error.

/// Handle to one authenticated context reachable in the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextHandle {
    /// Host-assigned context identifier.
    pub id: u64,
    /// URL the context is currently showing.
    pub url: String,
}

/// Enumerates authenticated contexts and runs the token extraction routine
/// inside them.
#[async_trait::async_trait]
pub trait ContextProbe: Send + Sync {
    /// Contexts currently showing a page whose URL matches `pattern`
    /// (host glob syntax, e.g. `https://www.amazon.it/*`).
    async fn contexts_matching(&self, pattern: &str) -> Vec<ContextHandle>;

    /// Run the extraction routine in `context`: an in-context global value,
    /// then a named meta attribute, then a named form field, first non-empty
    /// wins. `None` when all three are empty or the context is restricted.
    async fn extract_token(&self, context: &ContextHandle) -> Option<String>;
}

/// Read access to the host's credential jar.
#[async_trait::async_trait]
pub trait CookieJar: Send + Sync {
    /// The current cookie set for `domain`, as a single header-formatted
    /// string (`name=value; name2=value2`). Empty when no cookies exist.
    async fn cookie_header(&self, domain: &str) -> String;
}
