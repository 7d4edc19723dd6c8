//! Pluggable collaborator traits.
//!
//! The refinement engine only talks to these; [`crate::network::http`] has
//! the reqwest-backed implementations and tests use in-memory mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use detour_geometry::GeoPoint;

use crate::model::types::Result;
use crate::model::{AvoidInput, Route, TrafficFlow};
use crate::network::wire::FlowArea;

#[derive(Clone, Debug, PartialEq)]
pub struct RouteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Number of alternatives to ask for besides the primary route
    pub alternatives: u32,
    pub avoid: Arc<AvoidInput>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionRequest {
    /// Where the camera stands
    pub vantage: GeoPoint,
    /// Direction the camera looks, degrees
    pub heading: f64,
    pub confidence_threshold: f64,
}

/// Compute candidate routes between two points
pub trait RoutingService: Send + Sync {
    fn calculate_routes<'a>(
        &'a self,
        request: &'a RouteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Route>>> + Send + 'a>>;
}

/// Fetch current traffic flow for an area
pub trait TrafficFlowService: Send + Sync {
    fn flow<'a>(
        &'a self,
        area: &'a FlowArea,
    ) -> Pin<Box<dyn Future<Output = Result<TrafficFlow>> + Send + 'a>>;
}

/// Ask whether a stop sign is visible from a vantage point
pub trait VisionService: Send + Sync {
    fn detect_stop_sign<'a>(
        &'a self,
        request: &'a DetectionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;
}
