//! Sharp left turns to vision queries to hazard zones.

use std::time::Duration;

use detour_geometry::{bearing_degrees, point_behind, GeoPoint};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, trace, warn};

use crate::hazard::cache::DetectionCache;
use crate::hazard::dedup_hazards;
use crate::model::{HazardZone, Maneuver, ManeuverAction, Route, TurnDirection};
use crate::network::traits::{DetectionRequest, VisionService};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardSettings {
    /// Turns sharper than this many degrees are checked
    pub sharp_turn_angle: f64,
    /// How far before the turn the camera stands
    pub vantage_distance_m: f64,
    /// Zone radius, also the radius within which a turn counts as already known
    pub hazard_radius_m: f64,
    pub confidence_threshold: f64,
    /// Vision calls in flight at once
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for HazardSettings {
    fn default() -> Self {
        Self {
            sharp_turn_angle: 60.0,
            vantage_distance_m: 40.0,
            hazard_radius_m: 20.0,
            confidence_threshold: 0.25,
            concurrency: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

/// A turn worth asking the vision service about
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnCandidate {
    pub turn: GeoPoint,
    /// Bearing of the approach into the turn
    pub heading: f64,
    pub vantage: GeoPoint,
}

impl TurnCandidate {
    fn zone(&self, radius_m: f64) -> HazardZone {
        HazardZone::new(self.turn, self.heading, radius_m)
    }
}

pub fn is_sharp_left(maneuver: &Maneuver, min_angle: f64) -> bool {
    maneuver.action == ManeuverAction::Turn
        && maneuver.direction == Some(TurnDirection::Left)
        && maneuver.turn_angle.is_some_and(|angle| angle.abs() > min_angle)
}

/// Sharp left turns over all routes, skipping spots already covered by a
/// known hazard or by an earlier candidate
pub fn turn_candidates(
    routes: &[Route],
    known: &[HazardZone],
    settings: &HazardSettings,
) -> Vec<TurnCandidate> {
    let radius = settings.hazard_radius_m;
    let mut candidates: Vec<TurnCandidate> = Vec::new();

    for section in routes.iter().flat_map(|route| &route.sections) {
        let points = &section.points;
        for maneuver in &section.actions {
            if !is_sharp_left(maneuver, settings.sharp_turn_angle) {
                continue;
            }
            let offset = maneuver.offset;
            if offset == 0 || offset >= points.len() {
                trace!(offset, points = points.len(), "turn offset outside polyline");
                continue;
            }

            let turn = points[offset];
            let claimed = known
                .iter()
                .map(|hazard| hazard.location)
                .chain(candidates.iter().map(|c| c.turn))
                .any(|spot| spot.distance_to(turn) < radius);
            if claimed {
                continue;
            }

            let heading = bearing_degrees(points[offset - 1], turn);
            candidates.push(TurnCandidate {
                turn,
                heading,
                vantage: point_behind(turn, heading, settings.vantage_distance_m),
            });
        }
    }

    candidates
}

/// New hazard zones on `routes`.
///
/// Cached answers are used without calling the service. Remaining candidates
/// are checked concurrently; a failed or timed-out check counts as "not
/// detected" and is left out of the cache so a later pass retries it.
pub async fn detect_hazards(
    vision: &dyn VisionService,
    routes: &[Route],
    known: &[HazardZone],
    cache: &mut DetectionCache,
    settings: &HazardSettings,
) -> Vec<HazardZone> {
    let candidates = turn_candidates(routes, known, settings);

    let mut found: Vec<(usize, HazardZone)> = Vec::new();
    let mut pending: Vec<(usize, TurnCandidate)> = Vec::new();
    for (i, candidate) in candidates.into_iter().enumerate() {
        match cache.get(candidate.turn) {
            Some(true) => found.push((i, candidate.zone(settings.hazard_radius_m))),
            Some(false) => {}
            None => pending.push((i, candidate)),
        }
    }

    let cached = found.len();
    let checks = pending.len();

    let answers: Vec<(usize, TurnCandidate, Option<bool>)> = stream::iter(pending)
        .map(|(i, candidate)| async move {
            let answer = check_turn(vision, &candidate, settings).await;
            (i, candidate, answer)
        })
        .buffer_unordered(settings.concurrency.max(1))
        .collect()
        .await;

    for (i, candidate, answer) in answers {
        let Some(detected) = answer else {
            continue;
        };
        cache.insert(candidate.turn, detected);
        if detected {
            found.push((i, candidate.zone(settings.hazard_radius_m)));
        }
    }

    found.sort_by_key(|&(i, _)| i);
    let zones = dedup_hazards(found.into_iter().map(|(_, zone)| zone));
    debug!(cached, checks, detected = zones.len(), "hazard detection pass");
    zones
}

async fn check_turn(
    vision: &dyn VisionService,
    candidate: &TurnCandidate,
    settings: &HazardSettings,
) -> Option<bool> {
    let request = DetectionRequest {
        vantage: candidate.vantage,
        heading: candidate.heading,
        confidence_threshold: settings.confidence_threshold,
    };

    match tokio::time::timeout(settings.timeout, vision.detect_stop_sign(&request)).await {
        Ok(Ok(detected)) => {
            trace!(turn = %candidate.turn, detected, "vision answer");
            Some(detected)
        }
        Ok(Err(err)) => {
            warn!(turn = %candidate.turn, error = %err, "vision check failed");
            None
        }
        Err(_) => {
            warn!(turn = %candidate.turn, "vision check timed out");
            None
        }
    }
}
