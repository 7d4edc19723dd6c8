//! Route cost from traffic delay and stop signs.

use tracing::{debug, info};

use crate::matching::{hazards_on_route, segments_on_route};
use crate::model::{HazardZone, NoticeCode, PrioritizedSegment, Route, RouteScore, RouteViolations};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringSettings {
    /// Distance within which a segment shape counts as on the route
    pub match_threshold_m: f64,
    /// Distance within which a hazard turn point counts as on the route
    pub hazard_proximity_m: f64,
    /// Seconds added per stop sign
    pub stop_sign_penalty_s: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            match_threshold_m: 20.0,
            hazard_proximity_m: 30.0,
            stop_sign_penalty_s: 15.0,
        }
    }
}

/// Score one route against the accumulated segments and hazards.
///
/// Violations are only diagnosed when the provider flagged the route as
/// passing through a blocked road.
pub fn score_route(
    route: &Route,
    segments: &[PrioritizedSegment],
    hazards: &[HazardZone],
    settings: &ScoringSettings,
) -> (RouteScore, Option<RouteViolations>) {
    let matched = segments_on_route(segments, route, settings.match_threshold_m);
    let stops = hazards_on_route(hazards, route, settings.hazard_proximity_m);

    let traffic_delay_seconds = match route.base_duration() {
        Some(base) => route.duration() - base,
        None => matched.iter().map(|segment| segment.delay_seconds()).sum(),
    };

    let has_violation = route.has_notice(&NoticeCode::ViolatedBlockedRoad);
    let violations = has_violation.then(|| diagnose_violations(route));

    let score = RouteScore {
        traffic_segment_count: matched.len(),
        stop_sign_count: stops.len(),
        traffic_delay_seconds,
        total: traffic_delay_seconds + stops.len() as f64 * settings.stop_sign_penalty_s,
        has_violation,
    };
    debug!(
        route = %route.id,
        delay = score.traffic_delay_seconds,
        segments = score.traffic_segment_count,
        stops = score.stop_sign_count,
        total = score.total,
        "scored route"
    );
    (score, violations)
}

/// Avoids from the route's own request that it nonetheless passes through
pub fn diagnose_violations(route: &Route) -> RouteViolations {
    let spans = route.segment_ids();
    let avoid = &route.avoid_input;

    RouteViolations {
        segments: avoid
            .segments
            .iter()
            .filter(|id| spans.contains(*id))
            .copied()
            .collect(),
        areas: avoid
            .areas
            .iter()
            .filter(|area| route.points().any(|point| area.contains(point)))
            .copied()
            .collect(),
    }
}

/// Attach scores to every route and order them cheapest first, ties kept
/// in their current order
pub fn score_routes(
    routes: &mut [Route],
    segments: &[PrioritizedSegment],
    hazards: &[HazardZone],
    settings: &ScoringSettings,
) {
    for route in routes.iter_mut() {
        let (score, violations) = score_route(route, segments, hazards, settings);
        route.score = Some(score);
        route.violations = violations;
    }
    routes.sort_by(|a, b| a.total_cost().total_cmp(&b.total_cost()));

    if let Some(best) = routes.first() {
        info!(
            routes = routes.len(),
            best = %best.id,
            cost = best.total_cost(),
            "ranked routes"
        );
    }
}
