//! # pulse-client
//!
//! Carrier-facing client layer for the ParcelPulse tracking core.
//!
//! - [`context`]: consumed host interfaces (authenticated-context probing,
//!   cookie jar)
//! - [`credentials`]: last-moment anti-forgery token acquisition with a
//!   deterministic fallback chain
//! - [`tracking`]: the tracking-fetch protocol, including the bounded
//!   one-retry-on-invalid-token recovery
//! - [`normalize`]: raw payload → canonical [`pulse_core::records::TrackingRecord`]
//! - [`routing`]: best-effort routed-distance enhancement
//!
//! ## Crate Position
//!
//! Depends on `pulse-core` and `pulse-store`. Consumed by `pulse-tracker`.

#![deny(unsafe_code)]

pub mod context;
pub mod credentials;
pub mod errors;
pub mod normalize;
pub mod routing;
pub mod tracking;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::FetchError;

/// Build the HTTP client used for carrier and routing calls.
///
/// Carries an explicit request timeout; a hung carrier endpoint must surface
/// as a network error within the poll cycle, not stall the schedule.
#[must_use]
pub fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}
