//! Collaborator abstractions, wire formats and HTTP adapters.

pub mod http;
pub mod traits;
pub mod wire;

pub use http::{HttpRoutingClient, HttpTrafficFlowClient, HttpVisionClient, ServiceConfig};
pub use traits::{DetectionRequest, RouteRequest, RoutingService, TrafficFlowService, VisionService};
pub use wire::FlowArea;
