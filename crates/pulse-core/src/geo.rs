//! Great-circle distance math.
//!
//! The haversine value is the guaranteed baseline distance: always computable
//! when both endpoints exist, with the routed road distance layered on top as
//! an optional refinement by `pulse-client`.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in km, rounded to one decimal.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    round_one_decimal(EARTH_RADIUS_KM * c)
}

/// Round to one decimal place.
#[must_use]
pub fn round_one_decimal(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rome_to_milan() {
        let km = haversine_km(41.9028, 12.4964, 45.4642, 9.1900);
        assert!((km - 476.9).abs() < f64::EPSILON, "got {km}");
    }

    #[test]
    fn symmetric_in_point_order() {
        let forward = haversine_km(41.9028, 12.4964, 45.4642, 9.1900);
        let backward = haversine_km(45.4642, 9.1900, 41.9028, 12.4964);
        assert!((forward - backward).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_distance_for_same_point() {
        assert!(haversine_km(41.9, 12.5, 41.9, 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn short_hop_rounds_to_one_decimal() {
        // Two points ~1.1km apart in central Rome
        let km = haversine_km(41.9028, 12.4964, 41.9128, 12.4964);
        assert!((km - 1.1).abs() < f64::EPSILON, "got {km}");
    }

    #[test]
    fn rounding_helper() {
        assert!((round_one_decimal(1.2345) - 1.2).abs() < f64::EPSILON);
        assert!((round_one_decimal(1.25) - 1.3).abs() < f64::EPSILON);
    }
}
