use std::collections::HashSet;

use crate::hazard::merge_hazards;
use crate::identifiers::SegmentId;
use crate::model::{HazardZone, PrioritizedSegment, Route};

/// Everything a run has learned so far. Only ever grows.
#[derive(Debug, Default)]
pub struct Accumulator {
    pub routes: Vec<Route>,
    route_keys: HashSet<String>,
    pub segments: Vec<PrioritizedSegment>,
    segment_ids: HashSet<SegmentId>,
    pub hazards: Vec<HazardZone>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add routes with an unseen polyline, returning how many were added
    pub fn merge_routes(&mut self, routes: &[Route]) -> usize {
        let before = self.routes.len();
        for route in routes {
            if self.route_keys.insert(route.polyline_key()) {
                self.routes.push(route.clone());
            }
        }
        self.routes.len() - before
    }

    /// Add segments with an unseen id, returning how many were added
    pub fn merge_segments(&mut self, segments: Vec<PrioritizedSegment>) -> usize {
        let before = self.segments.len();
        for segment in segments {
            if self.segment_ids.insert(segment.id) {
                self.segments.push(segment);
            }
        }
        self.segments.len() - before
    }

    pub fn merge_hazards(&mut self, hazards: Vec<HazardZone>) -> usize {
        merge_hazards(&mut self.hazards, hazards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{route, segment, straight_line};
    use detour_geometry::GeoPoint;

    #[test]
    fn test_routes_dedup_by_polyline() {
        let line = straight_line(GeoPoint::new(10.0, 10.0), 4, 0.01);
        let other = straight_line(GeoPoint::new(10.1, 10.0), 4, 0.01);
        let mut acc = Accumulator::new();

        assert_eq!(acc.merge_routes(&[route("a", line.clone(), 60.0, None)]), 1);
        // Same geometry under a new id is still a duplicate
        assert_eq!(
            acc.merge_routes(&[route("b", line, 70.0, None), route("c", other, 60.0, None)]),
            1
        );
        let ids: Vec<&str> = acc.routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_segments_dedup_by_id() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.merge_segments(vec![segment(1, 0, None), segment(2, 1, None)]), 2);
        assert_eq!(acc.merge_segments(vec![segment(2, 5, None), segment(3, 0, None)]), 1);
        assert_eq!(acc.segments.len(), 3);
        // First sighting wins
        assert_eq!(acc.segments[1].priority, 1);
    }
}
