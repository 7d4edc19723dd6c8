//! Iterative route refinement.
//!
//! A run starts from the provider's initial alternatives, then repeats:
//! gather congestion and hazards around the current routes, ask for routes
//! avoiding them, and accept the answer if it fits the time budget and brings
//! something new. Every way out of the loop is a normal outcome; only
//! cancellation and an empty initial answer abort.

pub mod accumulator;
pub mod cancel;
pub mod config;
pub mod session;

pub use accumulator::Accumulator;
pub use cancel::{cancellation, CancelHandle, CancelToken};
pub use config::RefinementConfig;
pub use session::RefinementSession;

use std::sync::Arc;

use detour_geometry::{BoundingBox, GeoPoint};
use strum::Display;
use tracing::{debug, info, warn};

use crate::hazard::detect_hazards;
use crate::matching::get_cleaned_segments;
use crate::model::{least_delayed, AvoidInput, HazardZone, RefineError, Route};
use crate::network::traits::{RouteRequest, RoutingService, TrafficFlowService, VisionService};
use crate::scoring::score_routes;
use crate::traffic::TrafficCache;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefinementRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Extra seconds over the initial best route a refined route may take
    pub max_extra_time_seconds: f64,
}

/// Why the loop stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Termination {
    /// Neither new congestion nor new hazards turned up
    NoNewData,
    /// The avoid request came back empty
    NoRoutes,
    /// The best new route took longer than the budget allows
    BudgetExceeded,
    /// Every route in the answer had been seen before
    AllDuplicates,
    /// A route without traffic delay was found
    Optimal,
    IterationLimit,
}

#[derive(Debug)]
pub struct RefinementReport {
    /// Every distinct route seen, cheapest first
    pub routes: Vec<Route>,
    pub iterations: u32,
    pub termination: Termination,
    pub segment_count: usize,
    pub hazards: Vec<HazardZone>,
    /// Last avoid request built from the accumulated data
    pub avoid: Arc<AvoidInput>,
    /// Area the last traffic fetch covered
    pub coverage: Option<BoundingBox>,
    /// Latest arrival, in route seconds, a refined route may have
    pub target_eta: f64,
}

impl RefinementReport {
    pub fn best(&self) -> Option<&Route> {
        self.routes.first()
    }
}

pub struct Refiner {
    routing: Arc<dyn RoutingService>,
    traffic: Arc<dyn TrafficFlowService>,
    vision: Arc<dyn VisionService>,
    config: RefinementConfig,
}

impl Refiner {
    pub fn new(
        routing: Arc<dyn RoutingService>,
        traffic: Arc<dyn TrafficFlowService>,
        vision: Arc<dyn VisionService>,
        config: RefinementConfig,
    ) -> Self {
        Self {
            routing,
            traffic,
            vision,
            config,
        }
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    pub async fn run(
        &self,
        session: &mut RefinementSession,
        request: &RefinementRequest,
        cancel: &CancelToken,
    ) -> Result<RefinementReport, RefineError> {
        let config = &self.config;
        let hazard_settings = config.hazard_settings();

        if cancel.is_cancelled() {
            return Err(RefineError::Cancelled);
        }

        let mut avoid = Arc::new(AvoidInput::default());
        let initial = cancel.guard(self.fetch_routes(request, avoid.clone())).await?;
        let Some(baseline) = least_delayed(&initial) else {
            warn!(origin = %request.origin, destination = %request.destination, "no initial route");
            return Err(RefineError::NoRouteFound);
        };
        let target_eta = baseline.duration() + request.max_extra_time_seconds;
        info!(
            routes = initial.len(),
            baseline = baseline.duration(),
            delay = baseline.delay(),
            target_eta,
            "initial routes"
        );

        let mut current: Vec<Route> = initial
            .into_iter()
            .map(|route| route.tagged(0, avoid.clone()))
            .collect();
        let mut acc = Accumulator::new();
        acc.merge_routes(&current);
        let mut traffic_cache = TrafficCache::new();
        let mut iteration = 0;

        let termination = loop {
            if iteration >= config.max_iterations {
                break Termination::IterationLimit;
            }
            if cancel.is_cancelled() {
                return Err(RefineError::Cancelled);
            }
            iteration += 1;
            debug!(iteration, routes = current.len(), "iteration start");

            let known = &acc.hazards;
            let detection_cache = &mut session.detection_cache;
            let (segments, hazards) = cancel
                .guard(async {
                    tokio::join!(
                        traffic_cache.segments_for(
                            self.traffic.as_ref(),
                            &current,
                            config.jam_threshold,
                            config.traffic_timeout,
                        ),
                        detect_hazards(
                            self.vision.as_ref(),
                            &current,
                            known,
                            detection_cache,
                            &hazard_settings,
                        ),
                    )
                })
                .await?;

            let new_segments = acc.merge_segments(segments);
            let new_hazards = acc.merge_hazards(hazards);
            info!(
                iteration,
                new_segments,
                new_hazards,
                segments = acc.segments.len(),
                hazards = acc.hazards.len(),
                "merged traffic and hazards"
            );
            if new_segments == 0 && new_hazards == 0 {
                break Termination::NoNewData;
            }

            avoid = Arc::new(AvoidInput {
                segments: get_cleaned_segments(
                    &acc.segments,
                    &current,
                    config.max_avoid_segments,
                    config.match_threshold_m,
                ),
                areas: acc.hazards.iter().map(|zone| zone.bounding_box).collect(),
            });

            let fetched = cancel.guard(self.fetch_routes(request, avoid.clone())).await?;
            let Some(candidate) = least_delayed(&fetched) else {
                break Termination::NoRoutes;
            };
            let (duration, delay) = (candidate.duration(), candidate.delay());
            if duration > target_eta {
                info!(iteration, duration, target_eta, "best new route over budget");
                break Termination::BudgetExceeded;
            }

            let fetched: Vec<Route> = fetched
                .into_iter()
                .map(|route| route.tagged(iteration, avoid.clone()))
                .collect();
            if acc.merge_routes(&fetched) == 0 {
                break Termination::AllDuplicates;
            }

            current = fetched;
            debug!(iteration, duration, delay, "accepted routes");
            if delay <= 0.0 {
                break Termination::Optimal;
            }
        };

        info!(%termination, iterations = iteration, routes = acc.routes.len(), "refinement finished");

        let Accumulator {
            mut routes,
            segments,
            hazards,
            ..
        } = acc;
        score_routes(&mut routes, &segments, &hazards, &config.scoring_settings());

        Ok(RefinementReport {
            routes,
            iterations: iteration,
            termination,
            segment_count: segments.len(),
            hazards,
            avoid,
            coverage: traffic_cache.coverage(),
            target_eta,
        })
    }

    /// Routes for `request` under `avoid`; failures and timeouts yield none
    async fn fetch_routes(&self, request: &RefinementRequest, avoid: Arc<AvoidInput>) -> Vec<Route> {
        let route_request = RouteRequest {
            origin: request.origin,
            destination: request.destination,
            alternatives: self.config.alternatives,
            avoid,
        };

        let call = self.routing.calculate_routes(&route_request);
        match tokio::time::timeout(self.config.routing_timeout, call).await {
            Ok(Ok(routes)) => routes,
            Ok(Err(err)) => {
                warn!(error = %err, "routing request failed");
                Vec::new()
            }
            Err(_) => {
                warn!("routing request timed out");
                Vec::new()
            }
        }
    }
}
