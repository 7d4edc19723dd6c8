//! Axis-aligned latitude/longitude boxes.
//!
//! Boxes never wrap the antimeridian: `east >= west` always holds, so a box
//! straddling 180° cannot be represented. Routes crossing it are out of scope.

use crate::point::GeoPoint;
use crate::spatial::queries::{meters_to_lat_degrees, meters_to_lng_degrees};

/// Margin added on every side by [`merge_boxes`] (about 500 m)
pub const MERGE_MARGIN_DEGREES: f64 = 0.005;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Degenerate box at (0, 0)
    pub const ZERO: BoundingBox = BoundingBox {
        north: 0.0,
        south: 0.0,
        east: 0.0,
        west: 0.0,
    };

    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        debug_assert!(north >= south, "north {north} below south {south}");
        debug_assert!(east >= west, "east {east} below west {west}");
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Square-ish box extending `radius_m` from `center` in each cardinal direction
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let lat_offset = meters_to_lat_degrees(radius_m);
        let lng_offset = meters_to_lng_degrees(radius_m, center.lat);

        Self {
            north: center.lat + lat_offset,
            south: center.lat - lat_offset,
            east: center.lng + lng_offset,
            west: center.lng - lng_offset,
        }
    }

    /// Tight box around a set of points, `None` when there are none
    pub fn of_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;

        let mut bbox = Self {
            north: first.lat,
            south: first.lat,
            east: first.lng,
            west: first.lng,
        };
        for p in points {
            bbox.extend_to(p);
        }
        Some(bbox)
    }

    fn extend_to(&mut self, p: GeoPoint) {
        self.north = self.north.max(p.lat);
        self.south = self.south.min(p.lat);
        self.east = self.east.max(p.lng);
        self.west = self.west.min(p.lng);
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }

    /// Grow every side by `margin_deg`
    pub fn expand(&self, margin_deg: f64) -> Self {
        Self {
            north: self.north + margin_deg,
            south: self.south - margin_deg,
            east: self.east + margin_deg,
            west: self.west - margin_deg,
        }
    }

    /// Grow every side by at least `meters`, using the latitude closest to a
    /// pole for the longitude correction
    pub fn buffered(&self, meters: f64) -> Self {
        let lat_margin = meters_to_lat_degrees(meters);
        let widest_lat = self.north.abs().max(self.south.abs()).min(89.0);
        let lng_margin = meters_to_lng_degrees(meters, widest_lat);

        Self {
            north: self.north + lat_margin,
            south: self.south - lat_margin,
            east: self.east + lng_margin,
            west: self.west - lng_margin,
        }
    }

    /// Interval overlap on both axes (touching edges count)
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.south <= other.north
            && self.north >= other.south
            && self.west <= other.east
            && self.east >= other.west
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    /// True when `other` lies entirely inside this box
    pub fn covers(&self, other: &BoundingBox) -> bool {
        other.north <= self.north
            && other.south >= self.south
            && other.east <= self.east
            && other.west >= self.west
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            GeoPoint::new(self.north, self.west),
            GeoPoint::new(self.north, self.east),
            GeoPoint::new(self.south, self.east),
            GeoPoint::new(self.south, self.west),
        ]
    }
}

/// Union of all boxes plus [`MERGE_MARGIN_DEGREES`] on every side.
///
/// An empty input yields [`BoundingBox::ZERO`] without margin.
pub fn merge_boxes<'a, I>(boxes: I) -> BoundingBox
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    boxes
        .into_iter()
        .copied()
        .reduce(|acc, b| acc.union(&b))
        .map(|merged| merged.expand(MERGE_MARGIN_DEGREES))
        .unwrap_or(BoundingBox::ZERO)
}
