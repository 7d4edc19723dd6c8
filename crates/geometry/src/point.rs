//! WGS84 coordinate value type.

use std::fmt;

use crate::spatial::queries::{bearing_degrees, distance_meters};

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine distance in meters
    pub fn distance_to(&self, other: GeoPoint) -> f64 {
        distance_meters(*self, other)
    }

    /// Forward azimuth towards `other`, in [0, 360)
    pub fn bearing_to(&self, other: GeoPoint) -> f64 {
        bearing_degrees(*self, other)
    }

    /// Key for exact-ish lookups: both components rounded to `decimals` places.
    ///
    /// Five decimals is roughly one metre at mid latitudes.
    pub fn rounded_key(&self, decimals: u32) -> (i64, i64) {
        let factor = 10f64.powi(decimals as i32);
        (
            (self.lat * factor).round() as i64,
            (self.lng * factor).round() as i64,
        )
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}
