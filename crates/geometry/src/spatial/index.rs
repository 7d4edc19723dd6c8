//! R-tree over polyline edges.
//!
//! ## Two-Stage Filtering
//!
//! Proximity queries use a two-stage filtering approach:
//! 1. **R-tree filter**: envelope intersection in degree space picks candidate edges
//! 2. **Haversine filter**: exact point-to-segment distance in meters on the candidates
//!
//! The query envelope is padded by [`ENVELOPE_SLACK`] so the degree
//! approximation never drops an edge that is within range in meters.

use rstar::{RTree, RTreeObject, AABB};

use crate::bbox::BoundingBox;
use crate::point::GeoPoint;
use crate::spatial::queries::{distance_point_to_segment, meters_to_lat_degrees, meters_to_lng_degrees};

/// Padding factor applied to the degree envelope of a query radius
pub const ENVELOPE_SLACK: f64 = 1.5;

/// One edge of a polyline, indexed in `[lng, lat]` order
#[derive(Clone, Debug)]
pub struct EdgeNode {
    pub start: GeoPoint,
    pub end: GeoPoint,
    aabb: AABB<[f64; 2]>,
}

impl EdgeNode {
    pub fn new(start: GeoPoint, end: GeoPoint) -> Self {
        let aabb = AABB::from_corners([start.lng, start.lat], [end.lng, end.lat]);
        Self { start, end, aabb }
    }

    pub fn distance_to(&self, point: GeoPoint) -> f64 {
        distance_point_to_segment(point, self.start, self.end)
    }
}

impl RTreeObject for EdgeNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Spatial index over the consecutive edges of one point sequence
pub struct EdgeIndex {
    tree: RTree<EdgeNode>,
    bounds: Option<BoundingBox>,
}

impl EdgeIndex {
    /// Build the index from a polyline. Fewer than two points produce an empty index.
    pub fn from_points(points: &[GeoPoint]) -> Self {
        let edges: Vec<EdgeNode> = points
            .windows(2)
            .map(|pair| EdgeNode::new(pair[0], pair[1]))
            .collect();

        Self {
            tree: RTree::bulk_load(edges),
            bounds: BoundingBox::of_points(points.iter().copied()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Tight box around every indexed point
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Edges whose envelope comes within `radius_m` of `point`
    pub fn candidates(&self, point: GeoPoint, radius_m: f64) -> impl Iterator<Item = &EdgeNode> {
        let d_lat = meters_to_lat_degrees(radius_m) * ENVELOPE_SLACK;
        let d_lng = meters_to_lng_degrees(radius_m, point.lat).min(360.0) * ENVELOPE_SLACK;

        let envelope = AABB::from_corners(
            [point.lng - d_lng, point.lat - d_lat],
            [point.lng + d_lng, point.lat + d_lat],
        );
        self.tree.locate_in_envelope_intersecting(&envelope)
    }

    /// True when some edge lies within `threshold_m` meters of `point`
    pub fn any_within(&self, point: GeoPoint, threshold_m: f64) -> bool {
        self.candidates(point, threshold_m)
            .any(|edge| edge.distance_to(point) <= threshold_m)
    }
}
