//! Raw carrier payload → canonical [`TrackingRecord`].
//!
//! The response schema is undocumented and partial fields are the norm, so
//! every extraction here is tolerant: a missing package-location object means
//! "no GPS data yet" (an informational record, not an error), a non-numeric
//! stop count is dropped, and a coordinate pair is copied only when both
//! halves are present.

use serde_json::Value;

use pulse_core::records::{LastUpdate, TrackingRecord};
use pulse_core::status::ShipmentStatus;

/// Response code the carrier uses to reject a stale anti-forgery token.
const INVALID_TOKEN_CODE: &str = "INVALID_TOKEN";

/// Classification of one raw payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    /// The server rejected the token. The caller owns the retry policy;
    /// normalization only classifies.
    InvalidToken,
    /// A canonical record, possibly `UNKNOWN` with a reason attached.
    Record(TrackingRecord),
}

/// Normalize a raw tracking payload for `tracking_id`.
#[must_use]
pub fn normalize(tracking_id: &str, raw: &Value) -> Normalized {
    if raw.get("responseCode").and_then(Value::as_str) == Some(INVALID_TOKEN_CODE) {
        return Normalized::InvalidToken;
    }

    if !raw.is_object() {
        tracing::warn!(tracking_id, "unexpected payload shape: {raw}");
        let mut record = TrackingRecord::new(tracking_id, ShipmentStatus::Unknown);
        record.status_reason = Some("unexpected response shape".to_string());
        return Normalized::Record(record);
    }

    // An explicit refusal, distinct from "no GPS data yet": the carrier
    // answered but declined the request.
    if raw.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = raw
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("carrier declined the tracking request");
        tracing::warn!(tracking_id, reason, "tracking request refused");
        let mut record = TrackingRecord::new(tracking_id, ShipmentStatus::Unknown);
        record.status_reason = Some(reason.to_string());
        return Normalized::Record(record);
    }

    let Some(pkg) = raw.get("packageLocationDetails").filter(|v| v.is_object()) else {
        // Not an error: the carrier omits the object until GPS data exists.
        let status = raw
            .pointer("/value/status")
            .and_then(Value::as_str)
            .map_or(ShipmentStatus::Unknown, ShipmentStatus::from_raw);
        let mut record = TrackingRecord::new(tracking_id, status);
        record.status_reason = Some("GPS tracking not yet available".to_string());
        return Normalized::Record(record);
    };

    let status = pkg
        .get("trackingObjectState")
        .and_then(Value::as_str)
        .map_or(ShipmentStatus::Unknown, ShipmentStatus::from_raw);
    let mut record = TrackingRecord::new(tracking_id, status);

    record.stops_remaining = parse_stops(pkg.get("stopsRemaining"));

    if let Some((lat, lon)) = coordinate_pair(pkg.pointer("/transporterDetails/geoLocation")) {
        record.courier_lat = Some(lat);
        record.courier_lon = Some(lon);
        record.last_update = pkg
            .pointer("/transporterDetails/geoLocation/locationTime")
            .and_then(parse_last_update);
    }

    if let Some((lat, lon)) = coordinate_pair(pkg.pointer("/destinationAddress/geoLocation")) {
        record.dest_lat = Some(lat);
        record.dest_lon = Some(lon);
    }

    record.session_state = pkg
        .pointer("/transporterDetails/transporterSessionState")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    Normalized::Record(record)
}

/// Parse `stopsRemaining`, which the carrier sends as a number or a numeric
/// string. Non-numeric and negative values are dropped, never defaulted.
fn parse_stops(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Both latitude and longitude, or nothing. Partial coordinates are discarded
/// as a pair.
fn coordinate_pair(geo: Option<&Value>) -> Option<(f64, f64)> {
    let geo = geo?;
    let lat = geo.get("latitude").and_then(Value::as_f64)?;
    let lon = geo.get("longitude").and_then(Value::as_f64)?;
    Some((lat, lon))
}

fn parse_last_update(value: &Value) -> Option<LastUpdate> {
    match value {
        Value::Number(n) => n.as_f64().map(LastUpdate::Epoch),
        Value::String(s) if !s.is_empty() => Some(LastUpdate::Text(s.clone())),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    const ID: &str = "TBA305614523100";

    fn full_payload() -> Value {
        json!({
            "packageLocationDetails": {
                "trackingObjectState": "OUT_FOR_DELIVERY",
                "stopsRemaining": "4",
                "transporterDetails": {
                    "geoLocation": {
                        "latitude": 41.9050,
                        "longitude": 12.4820,
                        "locationTime": 1_700_000_000
                    },
                    "transporterSessionState": "opaque-session-blob"
                },
                "destinationAddress": {
                    "geoLocation": { "latitude": 41.9028, "longitude": 12.4964 }
                }
            }
        })
    }

    #[test]
    fn invalid_token_is_classified_not_parsed() {
        let raw = json!({ "responseCode": "INVALID_TOKEN" });
        assert_eq!(normalize(ID, &raw), Normalized::InvalidToken);
    }

    #[test]
    fn full_payload_maps_every_field() {
        let record = assert_matches!(
            normalize(ID, &full_payload()),
            Normalized::Record(r) => r
        );
        assert_eq!(record.tracking_id, ID);
        assert_eq!(record.status, ShipmentStatus::OutForDelivery);
        assert_eq!(record.stops_remaining, Some(4));
        assert_eq!(record.courier_lat, Some(41.9050));
        assert_eq!(record.courier_lon, Some(12.4820));
        assert_eq!(record.dest_lat, Some(41.9028));
        assert_eq!(record.dest_lon, Some(12.4964));
        assert_eq!(record.last_update, Some(LastUpdate::Epoch(1_700_000_000.0)));
        assert_eq!(
            record.session_state.as_deref(),
            Some("opaque-session-blob")
        );
    }

    #[test]
    fn refusal_surfaces_carrier_error_text() {
        let raw = json!({ "success": false, "error": "Tracking not available" });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(record.status, ShipmentStatus::Unknown);
        assert_eq!(
            record.status_reason.as_deref(),
            Some("Tracking not available")
        );
    }

    #[test]
    fn refusal_without_error_text_gets_generic_reason() {
        let raw = json!({ "success": false });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(record.status, ShipmentStatus::Unknown);
        assert_eq!(
            record.status_reason.as_deref(),
            Some("carrier declined the tracking request")
        );
    }

    #[test]
    fn missing_location_object_is_unknown_with_reason() {
        let raw = json!({ "success": true });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(record.status, ShipmentStatus::Unknown);
        assert!(record.status_reason.is_some());
    }

    #[test]
    fn missing_location_falls_back_to_value_status() {
        let raw = json!({ "value": { "status": "IN_TRANSIT" } });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(record.status, ShipmentStatus::InTransit);
        assert!(record.status_reason.is_some());
    }

    #[test]
    fn status_table_applies_case_insensitively() {
        for (raw_status, expected) in [
            ("delivered", ShipmentStatus::Delivered),
            ("PICKED_UP", ShipmentStatus::OutForDelivery),
            ("shipped", ShipmentStatus::InTransit),
            ("CREATED", ShipmentStatus::NotReady),
        ] {
            let raw = json!({
                "packageLocationDetails": { "trackingObjectState": raw_status }
            });
            let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
            assert_eq!(record.status, expected, "raw: {raw_status}");
        }
    }

    #[test]
    fn unrecognized_status_passes_through() {
        let raw = json!({
            "packageLocationDetails": { "trackingObjectState": "HELD_AT_DEPOT" }
        });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(
            record.status,
            ShipmentStatus::Other("HELD_AT_DEPOT".to_string())
        );
    }

    #[test]
    fn absent_tracking_object_state_is_unknown() {
        let raw = json!({ "packageLocationDetails": {} });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(record.status, ShipmentStatus::Unknown);
    }

    #[test]
    fn non_numeric_stops_are_dropped_not_zeroed() {
        for stops in [json!("soon"), json!(null), json!(-2), json!([])] {
            let raw = json!({
                "packageLocationDetails": {
                    "trackingObjectState": "IN_TRANSIT",
                    "stopsRemaining": stops
                }
            });
            let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
            assert_eq!(record.stops_remaining, None, "stops: {stops:?}");
        }
    }

    #[test]
    fn numeric_stops_accept_number_and_string() {
        for (stops, expected) in [(json!(7), 7), (json!("12"), 12), (json!(0), 0)] {
            let raw = json!({
                "packageLocationDetails": {
                    "trackingObjectState": "IN_TRANSIT",
                    "stopsRemaining": stops
                }
            });
            let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
            assert_eq!(record.stops_remaining, Some(expected));
        }
    }

    #[test]
    fn partial_coordinates_are_discarded_as_a_pair() {
        let raw = json!({
            "packageLocationDetails": {
                "trackingObjectState": "OUT_FOR_DELIVERY",
                "transporterDetails": {
                    "geoLocation": { "latitude": 41.9 }
                },
                "destinationAddress": {
                    "geoLocation": { "longitude": 12.5 }
                }
            }
        });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(record.courier_lat, None);
        assert_eq!(record.courier_lon, None);
        assert_eq!(record.dest_lat, None);
        assert_eq!(record.dest_lon, None);
    }

    #[test]
    fn non_object_payload_is_unknown_with_reason() {
        let record = assert_matches!(
            normalize(ID, &json!("oops")),
            Normalized::Record(r) => r
        );
        assert_eq!(record.status, ShipmentStatus::Unknown);
        assert_eq!(
            record.status_reason.as_deref(),
            Some("unexpected response shape")
        );
    }

    #[test]
    fn textual_location_time_is_kept() {
        let raw = json!({
            "packageLocationDetails": {
                "trackingObjectState": "OUT_FOR_DELIVERY",
                "transporterDetails": {
                    "geoLocation": {
                        "latitude": 41.9, "longitude": 12.5,
                        "locationTime": "2024-05-01T10:00:00Z"
                    }
                }
            }
        });
        let record = assert_matches!(normalize(ID, &raw), Normalized::Record(r) => r);
        assert_eq!(
            record.last_update,
            Some(LastUpdate::Text("2024-05-01T10:00:00Z".to_string()))
        );
    }
}
