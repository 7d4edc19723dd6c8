//! Candidate routes as returned by the routing collaborator.

use std::collections::HashSet;
use std::sync::Arc;

use detour_geometry::{BoundingBox, GeoPoint};
use strum::{Display, EnumString};

use crate::identifiers::{RouteIdentifier, SegmentId};
use crate::model::types::{AvoidInput, RouteScore, RouteViolations};

/// Maneuver kind reported for a turn-by-turn action
#[derive(Clone, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum ManeuverAction {
    Depart,
    Arrive,
    Turn,
    Continue,
    Keep,
    UTurn,
    Ramp,
    Exit,
    RoundaboutEnter,
    RoundaboutExit,
    #[strum(default)]
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
    Middle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Maneuver {
    pub action: ManeuverAction,
    pub direction: Option<TurnDirection>,
    /// Signed turn angle in degrees, when the provider reports one
    pub turn_angle: Option<f64>,
    /// Index into the owning section's decoded polyline
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum NoticeCode {
    ViolatedBlockedRoad,
    ViolatedAvoidTollRoad,
    #[strum(default)]
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    /// Travel time with current traffic, seconds
    pub duration: f64,
    /// Meters
    pub length: f64,
    /// Travel time without traffic, seconds
    pub base_duration: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub offset: usize,
    pub segment: Option<SegmentId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Header-first flexible polyline
    pub polyline: String,
    /// `polyline`, decoded once at the collaborator boundary
    pub points: Vec<GeoPoint>,
    pub summary: Summary,
    pub actions: Vec<Maneuver>,
    pub spans: Vec<Span>,
    pub notices: Vec<NoticeCode>,
}

impl Section {
    pub fn delay(&self) -> f64 {
        self.summary.duration - self.summary.base_duration.unwrap_or(self.summary.duration)
    }
}

#[derive(Clone, Debug)]
pub struct Route {
    pub id: RouteIdentifier,
    pub sections: Vec<Section>,
    /// Refinement iteration that produced this route (0 = initial request)
    pub iteration: u32,
    /// Avoid request this route was computed under
    pub avoid_input: Arc<AvoidInput>,
    pub score: Option<RouteScore>,
    pub violations: Option<RouteViolations>,
}

impl Route {
    pub fn new(id: impl Into<RouteIdentifier>, sections: Vec<Section>) -> Self {
        Self {
            id: id.into(),
            sections,
            iteration: 0,
            avoid_input: Arc::default(),
            score: None,
            violations: None,
        }
    }

    /// Attach the iteration and avoid snapshot this route was requested with
    pub fn tagged(mut self, iteration: u32, avoid_input: Arc<AvoidInput>) -> Self {
        self.iteration = iteration;
        self.avoid_input = avoid_input;
        self
    }

    /// Identity for duplicate detection across iterations
    pub fn polyline_key(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.polyline.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.sections.iter().flat_map(|s| s.points.iter().copied())
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(self.points())
    }

    pub fn duration(&self) -> f64 {
        self.sections.iter().map(|s| s.summary.duration).sum()
    }

    pub fn length(&self) -> f64 {
        self.sections.iter().map(|s| s.summary.length).sum()
    }

    /// Sum of provider base durations, `None` unless every section reports one
    pub fn base_duration(&self) -> Option<f64> {
        self.sections.iter().map(|s| s.summary.base_duration).sum()
    }

    /// Provider-reported traffic delay; sections without a base duration add nothing
    pub fn delay(&self) -> f64 {
        self.sections.iter().map(Section::delay).sum()
    }

    /// Segment ids referenced by the route's own spans
    pub fn segment_ids(&self) -> HashSet<SegmentId> {
        self.sections
            .iter()
            .flat_map(|s| s.spans.iter().filter_map(|span| span.segment))
            .collect()
    }

    pub fn has_notice(&self, code: &NoticeCode) -> bool {
        self.sections.iter().any(|s| s.notices.contains(code))
    }

    pub fn total_cost(&self) -> f64 {
        self.score.as_ref().map_or(f64::INFINITY, |s| s.total)
    }
}

/// Route with the smallest provider delay, first one on ties
pub fn least_delayed(routes: &[Route]) -> Option<&Route> {
    routes.iter().min_by(|a, b| a.delay().total_cmp(&b.delay()))
}
