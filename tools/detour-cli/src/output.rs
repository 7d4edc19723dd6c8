use anyhow::{Context, Result};
use detour_core::prelude::*;
use detour_geometry::{BoundingBox, GeoPoint};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use std::path::Path;

fn position(point: GeoPoint) -> Vec<f64> {
    vec![point.lng, point.lat]
}

/// Closed, counter-clockwise ring around a box
fn box_to_geojson(bbox: &BoundingBox) -> Value {
    let mut ring: Vec<Vec<f64>> = bbox.corners().iter().rev().map(|&c| position(c)).collect();
    ring.push(ring[0].clone());
    Value::Polygon(vec![ring])
}

fn feature(value: Value, properties: serde_json::Map<String, serde_json::Value>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn route_to_feature(route: &Route, rank: usize) -> Feature {
    let line: Vec<Vec<f64>> = route.points().map(position).collect();

    let mut properties = serde_json::Map::new();
    properties.insert("feature_type".to_string(), serde_json::json!("route"));
    properties.insert("rank".to_string(), serde_json::json!(rank));
    properties.insert("id".to_string(), serde_json::json!(route.id.as_str()));
    properties.insert("iteration".to_string(), serde_json::json!(route.iteration));
    properties.insert("duration_s".to_string(), serde_json::json!(route.duration()));
    properties.insert("length_m".to_string(), serde_json::json!(route.length()));
    properties.insert(
        "avoided_segments".to_string(),
        serde_json::json!(route.avoid_input.segments.len()),
    );
    if let Some(score) = &route.score {
        properties.insert("score".to_string(), serde_json::json!(score));
    }
    if let Some(violations) = &route.violations {
        properties.insert("violations".to_string(), serde_json::json!(violations));
    }

    feature(Value::LineString(line), properties)
}

fn hazard_to_feature(hazard: &HazardZone) -> Feature {
    let mut properties = serde_json::Map::new();
    properties.insert("feature_type".to_string(), serde_json::json!("stop_sign"));
    properties.insert("heading".to_string(), serde_json::json!(hazard.heading));
    properties.insert(
        "location".to_string(),
        serde_json::json!(position(hazard.location)),
    );

    feature(box_to_geojson(&hazard.bounding_box), properties)
}

pub fn report_to_geojson(report: &RefinementReport) -> GeoJson {
    let mut features: Vec<Feature> = report
        .routes
        .iter()
        .enumerate()
        .map(|(rank, route)| route_to_feature(route, rank + 1))
        .collect();

    features.extend(report.hazards.iter().map(hazard_to_feature));

    if let Some(coverage) = &report.coverage {
        let mut properties = serde_json::Map::new();
        properties.insert("feature_type".to_string(), serde_json::json!("traffic_coverage"));
        properties.insert(
            "segment_count".to_string(),
            serde_json::json!(report.segment_count),
        );
        features.push(feature(box_to_geojson(coverage), properties));
    }

    let mut foreign_members = serde_json::Map::new();
    foreign_members.insert(
        "termination".to_string(),
        serde_json::json!(report.termination.to_string()),
    );
    foreign_members.insert("iterations".to_string(), serde_json::json!(report.iterations));
    foreign_members.insert("target_eta_s".to_string(), serde_json::json!(report.target_eta));

    GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    })
}

/// Write the ranked routes, hazard boxes and traffic coverage to a GeoJSON file
pub fn write_report_geojson(report: &RefinementReport, output_path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(&report_to_geojson(report))
        .context("Failed to serialize GeoJSON")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write GeoJSON to {}", output_path.display()))?;

    Ok(())
}

/// Ranked route table on stdout
pub fn print_summary(report: &RefinementReport) {
    println!(
        "Stopped after {} iteration(s): {}",
        report.iterations, report.termination
    );
    println!(
        "Accumulated {} congested segment(s) and {} stop sign(s); budget {:.0} s",
        report.segment_count,
        report.hazards.len(),
        report.target_eta
    );
    println!();
    println!(
        "{:>4}  {:<24} {:>4} {:>9} {:>9} {:>5} {:>8} {:>9}",
        "rank", "route", "iter", "duration", "delay", "stops", "segments", "cost"
    );

    for (rank, route) in report.routes.iter().enumerate() {
        let score = route.score.unwrap_or_default();
        println!(
            "{:>4}  {:<24} {:>4} {:>8.0}s {:>8.0}s {:>5} {:>8} {:>8.0}s{}",
            rank + 1,
            route.id.as_str(),
            route.iteration,
            route.duration(),
            score.traffic_delay_seconds,
            score.stop_sign_count,
            score.traffic_segment_count,
            score.total,
            if score.has_violation { "  (violates avoids)" } else { "" }
        );
    }
}
