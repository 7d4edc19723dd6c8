//! reqwest-backed collaborator clients.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::types::Result;
use crate::model::{Route, ServiceError, TrafficFlow};
use crate::network::traits::{
    DetectionRequest, RouteRequest, RoutingService, TrafficFlowService, VisionService,
};
use crate::network::wire::{
    DetectRequestBody, DetectResponse, FlowArea, FlowRequestBody, FlowResponse, RouteRequestBody,
    RouteResponse,
};

pub const DEFAULT_ROUTING_URL: &str = "https://router.hereapi.com/v8/routes";
pub const DEFAULT_TRAFFIC_URL: &str = "https://data.traffic.hereapi.com/v7/flow";
pub const DEFAULT_VISION_URL: &str = "http://localhost:8000";

/// Endpoints and credentials for the three collaborators
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub routing_url: String,
    pub traffic_url: String,
    /// Base URL; requests go to `{vision_url}/detect`
    pub vision_url: String,
    pub api_key: String,
    /// Transport-level timeout applied to every HTTP request
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            routing_url: DEFAULT_ROUTING_URL.to_owned(),
            traffic_url: DEFAULT_TRAFFIC_URL.to_owned(),
            vision_url: DEFAULT_VISION_URL.to_owned(),
            api_key: String::new(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl ServiceConfig {
    pub fn client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::Status(status.as_u16()));
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

// ============================================================================
// Routing
// ============================================================================

pub struct HttpRoutingClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpRoutingClient {
    pub fn new(client: reqwest::Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            url: config.routing_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

fn route_query(request: &RouteRequest, api_key: &str) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("origin", request.origin.to_string()),
        ("destination", request.destination.to_string()),
        ("routingMode", "fast".to_owned()),
        ("transportMode", "car".to_owned()),
        ("return", "polyline,summary,turnByTurnActions".to_owned()),
        ("spans", "segmentRef".to_owned()),
    ];
    if request.alternatives > 0 {
        query.push(("alternatives", request.alternatives.to_string()));
    }
    query.push(("apiKey", api_key.to_owned()));
    query
}

impl RoutingService for HttpRoutingClient {
    fn calculate_routes<'a>(
        &'a self,
        request: &'a RouteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Route>>> + Send + 'a>> {
        Box::pin(async move {
            let body = RouteRequestBody::from(request.avoid.as_ref());
            debug!(
                avoid_segments = request.avoid.segments.len(),
                avoid_areas = request.avoid.areas.len(),
                "requesting routes"
            );

            let response = self
                .client
                .post(&self.url)
                .query(&route_query(request, &self.api_key))
                .json(&body)
                .send()
                .await?;

            let mut parsed: RouteResponse = read_json(response).await?;
            parsed.strip_format_versions();
            Ok(parsed.into_routes())
        })
    }
}

// ============================================================================
// Traffic flow
// ============================================================================

pub struct HttpTrafficFlowClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpTrafficFlowClient {
    pub fn new(client: reqwest::Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            url: config.traffic_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

impl TrafficFlowService for HttpTrafficFlowClient {
    fn flow<'a>(
        &'a self,
        area: &'a FlowArea,
    ) -> Pin<Box<dyn Future<Output = Result<TrafficFlow>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .query(&[("apiKey", self.api_key.as_str())])
                .json(&FlowRequestBody::new(area.clone()))
                .send()
                .await?;

            let parsed: FlowResponse = read_json(response).await?;
            debug!(items = parsed.results.len(), "received traffic flow");
            Ok(TrafficFlow::from(parsed))
        })
    }
}

// ============================================================================
// Vision
// ============================================================================

pub struct HttpVisionClient {
    client: reqwest::Client,
    url: String,
}

impl HttpVisionClient {
    pub fn new(client: reqwest::Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            url: format!("{}/detect", config.vision_url.trim_end_matches('/')),
        }
    }
}

impl VisionService for HttpVisionClient {
    fn detect_stop_sign<'a>(
        &'a self,
        request: &'a DetectionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            let body = DetectRequestBody {
                lat: request.vantage.lat,
                lon: request.vantage.lng,
                heading: request.heading,
                conf: request.confidence_threshold,
            };

            let response = self.client.post(&self.url).json(&body).send().await?;

            // No imagery at this spot
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(false);
            }

            let parsed: DetectResponse = read_json(response).await?;
            Ok(parsed.stop_sign_detected)
        })
    }
}
