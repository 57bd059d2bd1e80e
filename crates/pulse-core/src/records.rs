//! Wire and state records for the tracking core.
//!
//! Field names follow the stored camelCase JSON format, so records written by
//! earlier versions of the system deserialize unchanged.

use serde::{Deserialize, Serialize};

use crate::status::ShipmentStatus;

// ─────────────────────────────────────────────────────────────────────────────
// SessionRecord
// ─────────────────────────────────────────────────────────────────────────────

/// One captured credential set per carrier origin.
///
/// Invariants:
/// - at most one record per `domain` (the Session Store keys by domain);
/// - `updated_at` is monotonically non-decreasing;
/// - once a fetch has succeeded with both, a record is never persisted with
///   cookies but no token or vice versa.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Carrier domain this record belongs to (the store key).
    pub domain: String,
    /// Short-lived anti-forgery token.
    pub csrf_token: String,
    /// Header-formatted cookie blob (`name=value; name2=value2`).
    pub cookie_header: String,
    /// Page URL the token was captured from; used for re-derivation via a
    /// plain page fetch.
    #[serde(default)]
    pub source_url: String,
    /// When the token was last captured (epoch ms).
    pub captured_at: i64,
    /// When any field was last written (epoch ms).
    pub updated_at: i64,
}

/// Partial update applied to a [`SessionRecord`] by the Session Store.
///
/// `None` fields are left untouched on merge.
#[derive(Clone, Debug, Default)]
pub struct SessionPatch {
    /// New anti-forgery token.
    pub csrf_token: Option<String>,
    /// New cookie header.
    pub cookie_header: Option<String>,
    /// New capture source URL.
    pub source_url: Option<String>,
    /// New token capture time (epoch ms).
    pub captured_at: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TrackingRecord
// ─────────────────────────────────────────────────────────────────────────────

/// A courier location timestamp, which the carrier reports either as epoch
/// seconds or as a formatted string depending on payload shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LastUpdate {
    /// Epoch seconds.
    Epoch(f64),
    /// Preformatted timestamp string.
    Text(String),
}

/// Canonical view of one tracking poll.
///
/// Ephemeral: lives only inside a polling session, except as the "previous"
/// baseline for change detection. `distance_km` is computed whenever both
/// coordinate pairs are present; the routed fields are a refinement and are
/// never required for correctness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    /// Carrier tracking identifier.
    pub tracking_id: String,
    /// Canonical shipment status.
    pub status: ShipmentStatus,
    /// Domain the record was fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Delivery stops before this shipment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops_remaining: Option<u32>,
    /// Courier latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_lat: Option<f64>,
    /// Courier longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_lon: Option<f64>,
    /// Destination latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_lat: Option<f64>,
    /// Destination longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_lon: Option<f64>,
    /// When the courier position was last updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<LastUpdate>,
    /// Opaque carrier session state, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    /// Reason attached to an `UNKNOWN` status (e.g. no GPS data yet).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    /// Great-circle courier→destination distance, km, one decimal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Road-network distance, km. Present only if routing succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_distance_km: Option<f64>,
    /// Road-network travel time, minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_duration_min: Option<u32>,
    /// GeoJSON route geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_geometry: Option<serde_json::Value>,
}

impl TrackingRecord {
    /// Create an empty record for `tracking_id` with the given status.
    #[must_use]
    pub fn new(tracking_id: impl Into<String>, status: ShipmentStatus) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            status,
            domain: None,
            stops_remaining: None,
            courier_lat: None,
            courier_lon: None,
            dest_lat: None,
            dest_lon: None,
            last_update: None,
            session_state: None,
            status_reason: None,
            distance_km: None,
            road_distance_km: None,
            route_duration_min: None,
            route_geometry: None,
        }
    }

    /// Both courier and destination coordinate pairs are present.
    #[must_use]
    pub fn has_both_points(&self) -> bool {
        self.courier_lat.is_some()
            && self.courier_lon.is_some()
            && self.dest_lat.is_some()
            && self.dest_lon.is_some()
    }

    /// Best available courier→destination distance: routed if present,
    /// else great-circle.
    #[must_use]
    pub fn effective_distance_km(&self) -> Option<f64> {
        self.road_distance_km.or(self.distance_km)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PendingImport
// ─────────────────────────────────────────────────────────────────────────────

/// One-shot handoff of detected tracking IDs to an external collaborator.
///
/// Consumed exactly once: reading and acknowledging it deletes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingImport {
    /// Tracking IDs waiting to be imported.
    pub tracking_ids: Vec<String>,
    /// Domain they were detected on.
    pub domain: String,
    /// When the handoff record was written (epoch ms).
    pub created_at: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
