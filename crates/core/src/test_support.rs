//! In-memory collaborators and builders shared by the unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use detour_geometry::{encode_polyline, GeoPoint};

use crate::identifiers::{SegmentId, TravelDirection};
use crate::model::types::Result;
use crate::model::{
    DataSource, Maneuver, ManeuverAction, PrioritizedSegment, Route, Section, ServiceError,
    Summary, TrafficFlow, TurnDirection,
};
use crate::network::traits::{
    DetectionRequest, RouteRequest, RoutingService, TrafficFlowService, VisionService,
};
use crate::network::wire::FlowArea;

/// Points due east of `start`, `step` degrees of longitude apart
pub fn straight_line(start: GeoPoint, count: usize, step: f64) -> Vec<GeoPoint> {
    (0..count)
        .map(|i| GeoPoint::new(start.lat, start.lng + step * i as f64))
        .collect()
}

pub fn section(points: Vec<GeoPoint>, duration: f64, base_duration: Option<f64>) -> Section {
    let polyline = encode_polyline(&points, 6).unwrap();
    Section {
        polyline,
        points,
        summary: Summary {
            duration,
            length: 1000.0,
            base_duration,
        },
        actions: Vec::new(),
        spans: Vec::new(),
        notices: Vec::new(),
    }
}

pub fn route(id: &str, points: Vec<GeoPoint>, duration: f64, base_duration: Option<f64>) -> Route {
    Route::new(id, vec![section(points, duration, base_duration)])
}

pub fn left_turn(offset: usize, angle: f64) -> Maneuver {
    Maneuver {
        action: ManeuverAction::Turn,
        direction: Some(TurnDirection::Left),
        turn_angle: Some(angle),
        offset,
    }
}

pub fn segment(topology: u64, priority: u32, shape: Option<Vec<GeoPoint>>) -> PrioritizedSegment {
    PrioritizedSegment {
        id: SegmentId::new(topology, TravelDirection::Forward),
        priority,
        shape,
        length: 100.0,
        speed: 5.0,
        free_flow: 10.0,
        jam_factor: 8.0,
        data_source: DataSource::Realtime,
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Replays queued responses; once the queue is drained the last one repeats
pub struct MockRouting {
    responses: Mutex<VecDeque<Result<Vec<Route>>>>,
    last: Mutex<Vec<Route>>,
    /// Requests past the first `n` sleep for the given delay before answering
    stall: Option<(usize, Duration)>,
    pub requests: Mutex<Vec<RouteRequest>>,
}

impl MockRouting {
    pub fn new(responses: Vec<Result<Vec<Route>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(Vec::new()),
            stall: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn stalling_after(
        responses: Vec<Result<Vec<Route>>>,
        answered: usize,
        delay: Duration,
    ) -> Self {
        Self {
            stall: Some((answered, delay)),
            ..Self::new(responses)
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl RoutingService for MockRouting {
    fn calculate_routes<'a>(
        &'a self,
        request: &'a RouteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Route>>> + Send + 'a>> {
        Box::pin(async move {
            let seen = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.len() - 1
            };
            if let Some((answered, delay)) = self.stall {
                if seen >= answered {
                    tokio::time::sleep(delay).await;
                }
            }
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(routes)) => {
                    *self.last.lock().unwrap() = routes.clone();
                    Ok(routes)
                }
                Some(Err(err)) => Err(err),
                None => Ok(self.last.lock().unwrap().clone()),
            }
        })
    }
}

// ============================================================================
// Traffic flow
// ============================================================================

pub struct MockTraffic {
    flow: TrafficFlow,
    fail: bool,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl MockTraffic {
    pub fn new(flow: TrafficFlow) -> Self {
        Self {
            flow,
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(TrafficFlow::default())
        }
    }

    pub fn slow(flow: TrafficFlow, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(flow)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TrafficFlowService for MockTraffic {
    fn flow<'a>(
        &'a self,
        _area: &'a FlowArea,
    ) -> Pin<Box<dyn Future<Output = Result<TrafficFlow>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ServiceError::Status(503));
            }
            Ok(self.flow.clone())
        })
    }
}

// ============================================================================
// Vision
// ============================================================================

type Detector = dyn Fn(&DetectionRequest) -> Result<bool> + Send + Sync;

pub struct MockVision {
    detector: Box<Detector>,
    pub requests: Mutex<Vec<DetectionRequest>>,
}

impl MockVision {
    pub fn new<F>(detector: F) -> Self
    where
        F: Fn(&DetectionRequest) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            detector: Box::new(detector),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(answer: bool) -> Self {
        Self::new(move |_| Ok(answer))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl VisionService for MockVision {
    fn detect_stop_sign<'a>(
        &'a self,
        request: &'a DetectionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(*request);
            (self.detector)(request)
        })
    }
}
