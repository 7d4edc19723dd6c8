//! Spherical distance, bearing and offset calculations.
//!
//! All formulas assume a spherical Earth of radius [`EARTH_RADIUS_M`].

use crate::point::GeoPoint;

/// Mean Earth radius used by every formula in this crate
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Haversine distance between two points in meters
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + (d_lng / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    // Rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_M * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing (forward azimuth) from `from` to `to`, normalized to [0, 360)
pub fn bearing_degrees(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Point `distance_m` meters behind `point` when travelling along `heading_deg`
pub fn point_behind(point: GeoPoint, heading_deg: f64, distance_m: f64) -> GeoPoint {
    let reverse = ((heading_deg + 180.0) % 360.0).to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    let lat1 = point.lat.to_radians();
    let lng1 = point.lng.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * reverse.cos()).asin();
    let lng2 = lng1
        + (reverse.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lat2.to_degrees(), lng2.to_degrees())
}

/// Distance from `p` to segment `a`-`b` in meters.
///
/// The projection is clamped to the segment and computed in the planar
/// lng/lat space; only the final leg to the projected point is Haversine.
pub fn distance_point_to_segment(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        // Segment is actually a point
        return distance_meters(p, a);
    }

    let t = (((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);
    let closest = GeoPoint::new(a.lat + t * dy, a.lng + t * dx);

    distance_meters(p, closest)
}

/// Convert meters to degrees of latitude
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Convert meters to degrees of longitude at the given latitude
pub fn meters_to_lng_degrees(meters: f64, at_lat: f64) -> f64 {
    meters / (METERS_PER_DEGREE * at_lat.to_radians().cos())
}

/// Total Haversine length of a point sequence
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance_meters(pair[0], pair[1]))
        .sum()
}
