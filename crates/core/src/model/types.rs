//! Shared value types and errors.

use detour_geometry::{BoundingBox, GeoPoint};
use serde::Serialize;

use crate::identifiers::SegmentId;

// ============================================================================
// Avoidance
// ============================================================================

/// The exact avoid request a batch of routes was computed under
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AvoidInput {
    pub segments: Vec<SegmentId>,
    pub areas: Vec<BoundingBox>,
}

impl AvoidInput {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.areas.is_empty()
    }
}

/// A detected stop sign ahead of a sharp left turn
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HazardZone {
    /// Turn point the sign guards
    pub location: GeoPoint,
    /// Approach bearing in degrees
    pub heading: f64,
    pub bounding_box: BoundingBox,
}

impl HazardZone {
    pub fn new(location: GeoPoint, heading: f64, radius_m: f64) -> Self {
        Self {
            location,
            heading,
            bounding_box: BoundingBox::around(location, radius_m),
        }
    }
}

// ============================================================================
// Scoring
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteScore {
    pub traffic_segment_count: usize,
    pub stop_sign_count: usize,
    pub traffic_delay_seconds: f64,
    /// Seconds; lower is better
    pub total: f64,
    pub has_violation: bool,
}

/// Avoids from the route's own request that it still passes through
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteViolations {
    pub segments: Vec<SegmentId>,
    pub areas: Vec<BoundingBox>,
}

impl RouteViolations {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.areas.is_empty()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure talking to one of the external collaborators
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Outcomes that abort a refinement run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefineError {
    #[error("no route found between origin and destination")]
    NoRouteFound,

    #[error("refinement cancelled")]
    Cancelled,
}
