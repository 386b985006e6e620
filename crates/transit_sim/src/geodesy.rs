//! Great-circle distance and travel-time estimation between stops.
//!
//! Distances are computed with the `geo` crate's Haversine implementation
//! rather than a hand-rolled formula, point lookups stay in plain
//! `(lat, lon)` pairs since the engine has no need for a spatial index —
//! every route's stop count is small and lookups are by id, not proximity.

use geo::{HaversineDistance, Point};

/// Average scheduled bus speed, kilometers per hour.
pub const V_AVG_KPH: f64 = 40.0;

/// Coordinate match tolerance, in decimal degrees, used when resolving a
/// polyline point to a stop.
pub const COORD_TOLERANCE_DEG: f64 = 1e-4;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether `self` and `other` are within the stop-matching tolerance.
    pub fn matches(&self, other: &GeoPoint) -> bool {
        (self.lat - other.lat).abs() <= COORD_TOLERANCE_DEG
            && (self.lon - other.lon).abs() <= COORD_TOLERANCE_DEG
    }

    fn as_geo_point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Great-circle distance between two points, in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    a.as_geo_point().haversine_distance(&b.as_geo_point()) / 1000.0
}

/// Estimated travel time between two points at the constant average speed,
/// rounded to the nearest whole second. Never negative.
pub fn travel_seconds(a: GeoPoint, b: GeoPoint) -> u64 {
    let km = distance_km(a, b);
    ((km / V_AVG_KPH) * 3600.0).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_coincident_points_is_zero() {
        let p = GeoPoint::new(51.5, -0.1);
        assert_eq!(distance_km(p, p), 0.0);
        assert_eq!(travel_seconds(p, p), 0);
    }

    #[test]
    fn travel_seconds_matches_spec_example() {
        // A(0,0) to B(0.036,0) is approximately 4 km.
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.036, 0.0);
        let km = distance_km(a, b);
        assert!((km - 4.0).abs() < 0.1, "expected ~4km, got {km}");
        let secs = travel_seconds(a, b);
        assert!((secs as i64 - 360).abs() <= 10, "expected ~360s, got {secs}");
    }

    #[test]
    fn matches_respects_tolerance() {
        let a = GeoPoint::new(10.0, 20.0);
        let b = GeoPoint::new(10.00005, 20.00005);
        let c = GeoPoint::new(10.01, 20.0);
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }
}
