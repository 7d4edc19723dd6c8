//! Which congested segments and hazard zones lie on a set of routes.
//!
//! Every check is two-stage: a bounding-box overlap test first, then the
//! exact distance to the route's edges through an [`EdgeIndex`].

use detour_geometry::{BoundingBox, EdgeIndex, GeoPoint};
use itertools::Itertools;
use tracing::debug;

use crate::identifiers::SegmentId;
use crate::model::{HazardZone, PrioritizedSegment, Route};

/// Decoded geometry of one route, built once per matching pass
pub struct RouteGeometry {
    bounds: BoundingBox,
    index: EdgeIndex,
}

impl RouteGeometry {
    pub fn new(route: &Route) -> Option<Self> {
        let points: Vec<GeoPoint> = route.points().collect();
        let bounds = BoundingBox::of_points(points.iter().copied())?;
        Some(Self {
            bounds,
            index: EdgeIndex::from_points(&points),
        })
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// True when any point of `shape` lies within `threshold_m` of a route edge
    pub fn touches(&self, shape: &[GeoPoint], shape_bounds: &BoundingBox, threshold_m: f64) -> bool {
        if !self.bounds.buffered(threshold_m).intersects(shape_bounds) {
            return false;
        }
        shape
            .iter()
            .any(|&point| self.index.any_within(point, threshold_m))
    }
}

pub fn route_geometries(routes: &[Route]) -> Vec<RouteGeometry> {
    routes.iter().filter_map(RouteGeometry::new).collect()
}

/// Segments split by whether they lie on at least one route
#[derive(Debug, Default)]
pub struct SegmentMatch<'a> {
    pub intersecting: Vec<&'a PrioritizedSegment>,
    pub others: Vec<&'a PrioritizedSegment>,
}

pub fn match_segments<'a>(
    segments: &'a [PrioritizedSegment],
    routes: &[Route],
    threshold_m: f64,
) -> SegmentMatch<'a> {
    let geometries = route_geometries(routes);
    let (intersecting, others): (Vec<_>, Vec<_>) = segments
        .iter()
        .partition(|segment| on_any(segment, &geometries, threshold_m));
    SegmentMatch {
        intersecting,
        others,
    }
}

fn on_any(segment: &PrioritizedSegment, geometries: &[RouteGeometry], threshold_m: f64) -> bool {
    let (Some(shape), Some(bounds)) = (segment.shape.as_deref(), segment.shape_bounds()) else {
        return false;
    };
    geometries
        .iter()
        .any(|geometry| geometry.touches(shape, &bounds, threshold_m))
}

/// Segments of `segments` lying on `route`
pub fn segments_on_route<'a>(
    segments: &'a [PrioritizedSegment],
    route: &Route,
    threshold_m: f64,
) -> Vec<&'a PrioritizedSegment> {
    let Some(geometry) = RouteGeometry::new(route) else {
        return Vec::new();
    };
    segments
        .iter()
        .filter(|segment| on_any(segment, std::slice::from_ref(&geometry), threshold_m))
        .collect()
}

/// Segment ids to send as avoids, at most `max_count`.
///
/// Segments on the current routes come first; within each group higher
/// priority wins and ties keep their input order.
pub fn get_cleaned_segments(
    segments: &[PrioritizedSegment],
    routes: &[Route],
    max_count: usize,
    threshold_m: f64,
) -> Vec<SegmentId> {
    let unique: Vec<PrioritizedSegment> = segments
        .iter()
        .unique_by(|segment| segment.id)
        .cloned()
        .collect();

    let SegmentMatch {
        mut intersecting,
        mut others,
    } = match_segments(&unique, routes, threshold_m);

    intersecting.sort_by(|a, b| b.priority.cmp(&a.priority));
    others.sort_by(|a, b| b.priority.cmp(&a.priority));
    debug!(
        unique = unique.len(),
        on_route = intersecting.len(),
        max_count,
        "cleaning avoid segments"
    );

    intersecting
        .into_iter()
        .chain(others)
        .take(max_count)
        .map(|segment| segment.id)
        .collect()
}

/// Hazards whose box contains a route point or whose turn point lies within
/// `proximity_m` of one
pub fn hazards_on_route<'a>(
    hazards: &'a [HazardZone],
    route: &Route,
    proximity_m: f64,
) -> Vec<&'a HazardZone> {
    let points: Vec<GeoPoint> = route.points().collect();
    let Some(bounds) = BoundingBox::of_points(points.iter().copied()) else {
        return Vec::new();
    };
    let reach = bounds.buffered(proximity_m);

    hazards
        .iter()
        .filter(|hazard| reach.intersects(&hazard.bounding_box) || reach.contains(hazard.location))
        .filter(|hazard| {
            points.iter().any(|&point| {
                hazard.bounding_box.contains(point)
                    || hazard.location.distance_to(point) <= proximity_m
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::TravelDirection;
    use crate::model::{FlowItem, FlowSnapshot, SegmentRef, SubSegmentFlow, TrafficFlow};
    use crate::test_support::{route, segment, straight_line};
    use crate::traffic::extract_segments;

    fn base_route() -> Route {
        route("r", straight_line(GeoPoint::new(52.0, 13.0), 20, 0.001), 600.0, None)
    }

    /// Shape a few metres north of the route between two longitudes
    fn shape_near(lng: f64) -> Option<Vec<GeoPoint>> {
        Some(vec![
            GeoPoint::new(52.00005, lng),
            GeoPoint::new(52.00005, lng + 0.0005),
        ])
    }

    fn shape_far(lng: f64) -> Option<Vec<GeoPoint>> {
        Some(vec![GeoPoint::new(52.01, lng), GeoPoint::new(52.01, lng + 0.0005)])
    }

    #[test]
    fn test_match_segments_partitions() {
        let segments = vec![
            segment(1, 0, shape_near(13.002)),
            segment(2, 3, shape_far(13.002)),
            segment(3, 1, None),
            segment(4, 2, shape_near(13.010)),
        ];
        let matched = match_segments(&segments, &[base_route()], 20.0);

        let on: Vec<u64> = matched.intersecting.iter().map(|s| s.id.topology).collect();
        let off: Vec<u64> = matched.others.iter().map(|s| s.id.topology).collect();
        assert_eq!(on, vec![1, 4]);
        assert_eq!(off, vec![2, 3]);
    }

    #[test]
    fn test_cleaned_segments_put_route_segments_first() {
        let segments = vec![
            segment(1, 0, shape_near(13.002)),
            segment(2, 5, shape_far(13.002)),
            segment(3, 4, shape_far(13.004)),
            segment(4, 2, shape_near(13.010)),
            segment(4, 2, shape_near(13.010)),
        ];

        let cleaned = get_cleaned_segments(&segments, &[base_route()], 3, 20.0);
        let ids: Vec<u64> = cleaned.iter().map(|id| id.topology).collect();
        assert_eq!(ids, vec![4, 1, 2]);

        let all = get_cleaned_segments(&segments, &[base_route()], 250, 20.0);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_cleaned_segments_without_routes_rank_by_priority() {
        // 10 segments, alternating congestion across sub-segment windows
        let item = FlowItem {
            segments: (1..=10)
                .map(|i| SegmentRef {
                    id: Some(SegmentId::new(i, TravelDirection::Forward)),
                    length: 10.0,
                })
                .collect(),
            links: Vec::new(),
            flow: FlowSnapshot::default(),
            sub_segments: [(30.0, 8.0), (10.0, 1.0), (30.0, 8.0), (10.0, 1.0), (20.0, 8.0)]
                .into_iter()
                .map(|(length, jam_factor)| SubSegmentFlow {
                    length,
                    flow: FlowSnapshot {
                        speed: 3.0,
                        free_flow: 12.0,
                        jam_factor,
                        confidence: 0.9,
                        ..Default::default()
                    },
                })
                .collect(),
        };
        let segments = extract_segments(&TrafficFlow { items: vec![item] }, 5.0);
        assert_eq!(segments.len(), 8);

        let cleaned = get_cleaned_segments(&segments, &[], 3, 20.0);
        let ids: Vec<u64> = cleaned.iter().map(|id| id.topology).collect();
        // Edges of each congested run first, in input order
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_cleaned_segments_never_exceed_max() {
        let segments: Vec<_> = (0..40).map(|i| segment(i, (i % 7) as u32, None)).collect();
        for max in [0, 1, 5, 39, 40, 100] {
            let cleaned = get_cleaned_segments(&segments, &[base_route()], max, 20.0);
            assert!(cleaned.len() <= max);
            assert_eq!(cleaned.iter().unique().count(), cleaned.len());
        }
    }

    #[test]
    fn test_segments_on_route() {
        let segments = vec![segment(1, 0, shape_near(13.002)), segment(2, 0, shape_far(13.0))];
        let on = segments_on_route(&segments, &base_route(), 20.0);
        assert_eq!(on.len(), 1);
        assert_eq!(on[0].id.topology, 1);
    }

    #[test]
    fn test_hazards_on_route() {
        let route = base_route();
        let hazards = vec![
            // Box straddles the route
            HazardZone::new(GeoPoint::new(52.0001, 13.005), 90.0, 20.0),
            // Box misses the route but the turn point is within 30 m
            HazardZone::new(GeoPoint::new(52.00025, 13.007), 90.0, 20.0),
            // Well away
            HazardZone::new(GeoPoint::new(52.002, 13.007), 90.0, 20.0),
        ];

        let found = hazards_on_route(&hazards, &route, 30.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].location, hazards[0].location);
        assert_eq!(found[1].location, hazards[1].location);
    }
}
