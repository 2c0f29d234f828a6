//! Builders shared by unit and behaviour tests.

use geo::{LineString, MultiPolygon, Polygon};

use crate::{CanonicalWellRecord, StateBoundaries, WellRecord, WellStatus};

/// A record from source `"Test"` at the given point.
pub fn well(id: &str, status: WellStatus, latitude: f64, longitude: f64) -> WellRecord {
    WellRecord::new(id, "Test", status).with_location(latitude, longitude)
}

/// Canonical record without coordinates claiming `state`.
pub fn canonical(id: &str, state: &str, status: WellStatus) -> CanonicalWellRecord {
    CanonicalWellRecord::from(WellRecord::new(id, "Test", status).with_state(state))
}

/// Axis-aligned rectangle as a multipolygon.
pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> MultiPolygon<f64> {
    let ring = LineString::from(vec![
        (min_lon, min_lat),
        (max_lon, min_lat),
        (max_lon, max_lat),
        (min_lon, max_lat),
        (min_lon, min_lat),
    ]);
    MultiPolygon(vec![Polygon::new(ring, Vec::new())])
}

/// Boundaries holding one rectangular state.
pub fn rectangular_state(
    abbrev: &str,
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
) -> StateBoundaries {
    StateBoundaries::default().with_state(abbrev, rectangle(min_lon, min_lat, max_lon, max_lat))
}
