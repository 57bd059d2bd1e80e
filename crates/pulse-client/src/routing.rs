//! Road-distance refinement over a public routing service.
//!
//! The straight-line estimate from the haversine formula is always computed
//! locally and never blocked on the network; the routing call only upgrades
//! it with driving distance, duration, and a drawable geometry when the
//! service cooperates. Any failure along the way degrades to the baseline.

use serde_json::Value;

use pulse_core::geo::haversine_km;
use pulse_core::records::TrackingRecord;

/// Default public routing endpoint.
const DEFAULT_ROUTER: &str = "https://router.project-osrm.org";

/// One resolved driving route between two points.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSummary {
    /// Driving distance in kilometres, one decimal.
    pub km: f64,
    /// Driving duration in whole minutes.
    pub minutes: u32,
    /// GeoJSON geometry of the route, for map rendering.
    pub geometry: Value,
}

/// Client for the external routing service.
#[derive(Clone)]
pub struct RouteClient {
    base_url: String,
    http: reqwest::Client,
}

impl RouteClient {
    /// Client against the default public router.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, DEFAULT_ROUTER)
    }

    /// Client against a specific router origin. Test hook.
    #[must_use]
    pub fn with_base_url(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Resolve the driving route from `(lat1, lon1)` to `(lat2, lon2)`.
    ///
    /// `None` covers every failure mode: transport errors, non-JSON bodies,
    /// and the service's own non-`Ok` result codes.
    #[tracing::instrument(skip(self))]
    pub async fn routed_distance(
        &self,
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
    ) -> Option<RouteSummary> {
        // The routing service takes lon,lat order.
        let url = format!(
            "{}/route/v1/driving/{lon1},{lat1};{lon2},{lat2}?overview=full&geometries=geojson",
            self.base_url
        );

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("routing request failed: {e}");
                return None;
            }
        };
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("undecodable routing response: {e}");
                return None;
            }
        };

        if body.get("code").and_then(Value::as_str) != Some("Ok") {
            tracing::debug!(code = ?body.get("code"), "routing service declined");
            return None;
        }
        let route = body.pointer("/routes/0")?;
        let meters = route.get("distance").and_then(Value::as_f64)?;
        let seconds = route.get("duration").and_then(Value::as_f64)?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let minutes = (seconds / 60.0).round() as u32;

        Some(RouteSummary {
            km: (meters / 1000.0 * 10.0).round() / 10.0,
            minutes,
            geometry: route.get("geometry").cloned().unwrap_or(Value::Null),
        })
    }

    /// Enrich `record` with distance data when both endpoints are known.
    ///
    /// The straight-line distance is always filled in; the routed fields are
    /// only set when the routing service answers.
    pub async fn enrich(&self, record: &mut TrackingRecord) {
        if !record.has_both_points() {
            return;
        }
        let (Some(clat), Some(clon), Some(dlat), Some(dlon)) = (
            record.courier_lat,
            record.courier_lon,
            record.dest_lat,
            record.dest_lon,
        ) else {
            return;
        };

        record.distance_km = Some(haversine_km(clat, clon, dlat, dlon));

        if let Some(route) = self.routed_distance(clat, clon, dlat, dlon).await {
            record.road_distance_km = Some(route.km);
            record.route_duration_min = Some(route.minutes);
            record.route_geometry = Some(route.geometry);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
