use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use detour_core::network::http::{DEFAULT_ROUTING_URL, DEFAULT_TRAFFIC_URL, DEFAULT_VISION_URL};
use detour_core::prelude::*;
use tracing::{info, warn, Level};

mod output;

use output::{print_summary, write_report_geojson};

#[derive(Parser, Debug)]
#[command(
    name = "detour",
    author,
    version,
    about = "Refine a driving route around traffic congestion and stop-sign hazards",
    long_about = "Requests routes between two points, then repeatedly asks for new routes \
                  avoiding congested road segments and sharp left turns guarded by stop \
                  signs, as long as the best new route stays within the extra-time budget.\n\n\
                  Routing and traffic come from the HERE APIs; stop signs come from a \
                  vision service that looks at street-level imagery."
)]
struct Args {
    /// Start point as "lat,lng"
    #[arg(value_parser = parse_point)]
    origin: GeoPoint,

    /// End point as "lat,lng"
    #[arg(value_parser = parse_point)]
    destination: GeoPoint,

    /// Extra seconds a refined route may take over the initial best route
    #[arg(long, env = "DETOUR_MAX_EXTRA_TIME", default_value = "300")]
    max_extra_time: f64,

    /// API key for the routing and traffic services
    #[arg(long, env = "HERE_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "DETOUR_ROUTING_URL", default_value = DEFAULT_ROUTING_URL)]
    routing_url: String,

    #[arg(long, env = "DETOUR_TRAFFIC_URL", default_value = DEFAULT_TRAFFIC_URL)]
    traffic_url: String,

    /// Base URL of the stop-sign detection service
    #[arg(long, env = "DETOUR_VISION_URL", default_value = DEFAULT_VISION_URL)]
    vision_url: String,

    #[arg(long, env = "DETOUR_MAX_ITERATIONS", default_value = "5")]
    max_iterations: u32,

    /// Jam factor (0 to 10) at or above which a road counts as congested
    #[arg(long, env = "DETOUR_JAM_THRESHOLD", default_value = "5")]
    jam_threshold: f64,

    /// Vision requests in flight at once
    #[arg(long, env = "DETOUR_VISION_CONCURRENCY", default_value = "4")]
    vision_concurrency: usize,

    /// HTTP timeout in seconds
    #[arg(long, env = "DETOUR_HTTP_TIMEOUT", default_value = "20")]
    http_timeout: u64,

    /// Write routes, hazards and traffic coverage to this GeoJSON file
    #[arg(short, long)]
    geojson: Option<PathBuf>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn parse_point(s: &str) -> std::result::Result<GeoPoint, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {s:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinate out of range: {lat},{lng}"));
    }
    Ok(GeoPoint::new(lat, lng))
}

impl Args {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            routing_url: self.routing_url.clone(),
            traffic_url: self.traffic_url.clone(),
            vision_url: self.vision_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.http_timeout),
        }
    }

    fn refinement_config(&self) -> RefinementConfig {
        RefinementConfig {
            max_iterations: self.max_iterations,
            jam_threshold: self.jam_threshold,
            vision_concurrency: self.vision_concurrency,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    if args.api_key.trim().is_empty() {
        bail!("HERE_API_KEY is empty");
    }
    if args.max_extra_time < 0.0 {
        bail!("--max-extra-time must not be negative");
    }

    let services = args.service_config();
    let client = services.client().context("Failed to build HTTP client")?;
    let refiner = Refiner::new(
        Arc::new(HttpRoutingClient::new(client.clone(), &services)),
        Arc::new(HttpTrafficFlowClient::new(client.clone(), &services)),
        Arc::new(HttpVisionClient::new(client, &services)),
        args.refinement_config(),
    );

    let (handle, token) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling refinement");
            handle.cancel();
        }
    });

    let request = RefinementRequest {
        origin: args.origin,
        destination: args.destination,
        max_extra_time_seconds: args.max_extra_time,
    };
    info!(origin = %request.origin, destination = %request.destination, "refining route");

    let mut session = RefinementSession::new();
    let report = refiner
        .run(&mut session, &request, &token)
        .await
        .context("Route refinement failed")?;

    print_summary(&report);

    if let Some(path) = &args.geojson {
        write_report_geojson(&report, path).context("Failed to write GeoJSON")?;
        info!(path = %path.display(), "wrote GeoJSON");
    }

    Ok(())
}
