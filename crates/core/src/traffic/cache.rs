//! Coverage-scoped traffic flow cache.

use std::time::Duration;

use detour_geometry::{merge_boxes, BoundingBox};
use tracing::{debug, warn};

use crate::model::{PrioritizedSegment, Route, TrafficFlow};
use crate::network::traits::TrafficFlowService;
use crate::network::wire::FlowArea;
use crate::traffic::extract::extract_segments;

/// Last flow response together with the box it was fetched for.
///
/// Owned by a single refinement run. The collaborator is only called again
/// when the routes spread beyond the area already fetched.
#[derive(Debug, Default)]
pub struct TrafficCache {
    coverage: Option<BoundingBox>,
    flow: Option<TrafficFlow>,
}

impl TrafficCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Area of the last successful fetch
    pub fn coverage(&self) -> Option<BoundingBox> {
        self.coverage
    }

    /// Congested segments around `routes`, fetching flow only when needed.
    ///
    /// A failed or timed-out fetch leaves the cache as it was and yields no
    /// segments.
    pub async fn segments_for(
        &mut self,
        service: &dyn TrafficFlowService,
        routes: &[Route],
        jam_threshold: f64,
        timeout: Duration,
    ) -> Vec<PrioritizedSegment> {
        let boxes: Vec<BoundingBox> = routes.iter().filter_map(Route::bounds).collect();
        if boxes.is_empty() {
            return Vec::new();
        }
        let area = merge_boxes(&boxes);

        let covered = self.coverage.is_some_and(|coverage| coverage.covers(&area));
        if let Some(flow) = self.flow.as_ref().filter(|_| covered) {
            debug!(items = flow.items.len(), "reusing cached traffic flow");
            return extract_segments(flow, jam_threshold);
        }

        let request = FlowArea::from(area);
        let flow = match tokio::time::timeout(timeout, service.flow(&request)).await {
            Ok(Ok(flow)) => flow,
            Ok(Err(err)) => {
                warn!(error = %err, "traffic flow request failed");
                return Vec::new();
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "traffic flow request timed out");
                return Vec::new();
            }
        };

        debug!(
            items = flow.items.len(),
            north = area.north,
            south = area.south,
            east = area.east,
            west = area.west,
            "fetched traffic flow"
        );
        let segments = extract_segments(&flow, jam_threshold);
        self.coverage = Some(area);
        self.flow = Some(flow);
        segments
    }
}
