//! # detour-core
//!
//! Route refinement around live traffic congestion and stop-sign hazards.
//!
//! ## Features
//!
//! - **Traffic extraction**: provider flow data to prioritized congested segments
//! - **Hazard detection**: sharp left turns checked against a vision service
//! - **Geometric matching**: which segments and hazards lie on which routes
//! - **Scoring**: traffic delay plus a penalty per stop sign
//! - **Refinement loop**: re-route with avoids until nothing better turns up
//! - **Pluggable services**: routing, traffic and vision behind traits
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use detour_core::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let services = ServiceConfig {
//!     api_key: "your-key".into(),
//!     ..Default::default()
//! };
//! let client = services.client()?;
//!
//! let refiner = Refiner::new(
//!     Arc::new(HttpRoutingClient::new(client.clone(), &services)),
//!     Arc::new(HttpTrafficFlowClient::new(client.clone(), &services)),
//!     Arc::new(HttpVisionClient::new(client, &services)),
//!     RefinementConfig::default(),
//! );
//!
//! let request = RefinementRequest {
//!     origin: GeoPoint::new(52.5200, 13.4050),
//!     destination: GeoPoint::new(52.5008, 13.4497),
//!     max_extra_time_seconds: 300.0,
//! };
//! let report = refiner
//!     .run(&mut RefinementSession::new(), &request, &CancelToken::never())
//!     .await?;
//! println!("{} after {} iterations", report.termination, report.iterations);
//! # Ok(())
//! # }
//! ```

pub mod hazard;
pub mod identifiers;
pub mod matching;
pub mod model;
pub mod network;
pub mod refine;
pub mod scoring;
pub mod traffic;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub mod prelude {
    pub use detour_geometry::{BoundingBox, GeoPoint};

    pub use crate::hazard::{detect_hazards, DetectionCache, HazardSettings};
    pub use crate::identifiers::*;
    pub use crate::matching::{get_cleaned_segments, hazards_on_route, match_segments};
    pub use crate::model::{
        AvoidInput, HazardZone, PrioritizedSegment, RefineError, Route, RouteScore,
        RouteViolations, ServiceError, TrafficFlow,
    };
    pub use crate::network::http::{
        HttpRoutingClient, HttpTrafficFlowClient, HttpVisionClient, ServiceConfig,
    };
    pub use crate::network::traits::*;
    pub use crate::refine::{
        cancellation, CancelHandle, CancelToken, RefinementConfig, RefinementReport,
        RefinementRequest, RefinementSession, Refiner, Termination,
    };
    pub use crate::scoring::{score_routes, ScoringSettings};
    pub use crate::traffic::{extract_segments, TrafficCache};
}

pub use prelude::*;
