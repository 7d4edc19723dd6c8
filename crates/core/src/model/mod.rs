//! Route, traffic and hazard models.

pub mod route;
pub mod traffic;
pub mod types;

// Re-exports for convenience
pub use route::{
    least_delayed, Maneuver, ManeuverAction, NoticeCode, Route, Section, Span, Summary,
    TurnDirection,
};
pub use traffic::{
    DataSource, FlowItem, FlowSnapshot, PrioritizedSegment, SegmentRef, ShapeLink,
    SubSegmentFlow, TrafficFlow, Traversability,
};
pub use types::{
    AvoidInput, HazardZone, RefineError, Result, RouteScore, RouteViolations, ServiceError,
};
