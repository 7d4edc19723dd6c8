//! JSON shapes exchanged with the routing, traffic-flow and vision services.
//!
//! These types mirror the JSON. The `TryFrom` conversions validate once into
//! [`crate::model`] types; malformed units are logged and skipped here and
//! nowhere else.

use detour_geometry::{decode_polyline, path_length, strip_format_version, BoundingBox, GeoPoint};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::identifiers::{RefReplacements, SegmentId};
use crate::model::{
    AvoidInput, FlowItem, FlowSnapshot, Maneuver, ManeuverAction, NoticeCode, Route, Section,
    SegmentRef, ServiceError, ShapeLink, Span, SubSegmentFlow, Summary, TrafficFlow,
    Traversability,
};

/// One element of a wire list that may fail to deserialize on its own.
///
/// A bad element is kept as its error so the rest of the payload still
/// parses; the `TryFrom` conversions decide what skipping it means.
#[derive(Debug, Clone)]
pub enum Lenient<T> {
    Valid(T),
    Invalid(String),
}

impl<T> Lenient<T> {
    pub fn as_valid_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, ServiceError> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Invalid(err) => Err(ServiceError::Malformed(err)),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match serde_json::from_value(value) {
            Ok(parsed) => Self::Valid(parsed),
            Err(err) => Self::Invalid(err.to_string()),
        })
    }
}

/// Keep the valid elements, logging each dropped one as `what`
fn valid_units<T, U>(
    units: Vec<Lenient<T>>,
    what: &'static str,
    convert: impl Fn(T) -> Result<U, ServiceError>,
) -> Vec<U> {
    units
        .into_iter()
        .filter_map(|unit| match unit.into_result().and_then(&convert) {
            Ok(converted) => Some(converted),
            Err(err) => {
                warn!(error = %err, "skipping malformed {}", what);
                None
            }
        })
        .collect()
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct WireAvoid {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub areas: Vec<String>,
}

impl From<&AvoidInput> for WireAvoid {
    fn from(avoid: &AvoidInput) -> Self {
        Self {
            segments: avoid.segments.iter().map(SegmentId::to_string).collect(),
            areas: avoid.areas.iter().map(bbox_area).collect(),
        }
    }
}

/// `bbox:west,south,east,north`
pub fn bbox_area(bbox: &BoundingBox) -> String {
    format!("bbox:{},{},{},{}", bbox.west, bbox.south, bbox.east, bbox.north)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteRequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid: Option<WireAvoid>,
}

impl From<&AvoidInput> for RouteRequestBody {
    fn from(avoid: &AvoidInput) -> Self {
        Self {
            avoid: (!avoid.is_empty()).then(|| WireAvoid::from(avoid)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    #[serde(default)]
    pub routes: Vec<Lenient<WireRoute>>,
    #[serde(default)]
    pub ref_replacements: RefReplacements,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireRoute {
    pub id: Option<String>,
    #[serde(default)]
    pub sections: Vec<WireSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSection {
    pub polyline: Option<String>,
    pub summary: Option<WireSummary>,
    #[serde(default)]
    pub turn_by_turn_actions: Vec<Lenient<WireAction>>,
    #[serde(default)]
    pub spans: Vec<Lenient<WireSpan>>,
    #[serde(default)]
    pub notices: Vec<Lenient<WireNotice>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSummary {
    pub duration: f64,
    #[serde(default)]
    pub length: f64,
    pub base_duration: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAction {
    pub action: String,
    pub direction: Option<String>,
    pub turn_angle: Option<f64>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn first(&self) -> Option<&str> {
        match self {
            Self::One(s) => Some(s),
            Self::Many(v) => v.first().map(String::as_str),
        }
    }

    fn expand(&mut self, replacements: &RefReplacements) {
        let expand = |s: &mut String| {
            let expanded = replacements.expand(s).into_owned();
            *s = expanded;
        };
        match self {
            Self::One(s) => expand(s),
            Self::Many(v) => v.iter_mut().for_each(expand),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSpan {
    pub offset: usize,
    pub segment_ref: Option<OneOrMany>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireNotice {
    pub code: String,
}

impl RouteResponse {
    /// Expand compact span references in place
    pub fn expand_refs(&mut self) {
        if self.ref_replacements.is_empty() {
            return;
        }
        for span in self
            .routes
            .iter_mut()
            .filter_map(Lenient::as_valid_mut)
            .flat_map(|r| r.sections.iter_mut())
            .flat_map(|s| s.spans.iter_mut())
            .filter_map(Lenient::as_valid_mut)
        {
            if let Some(reference) = span.segment_ref.as_mut() {
                reference.expand(&self.ref_replacements);
            }
        }
    }

    /// Drop the format version prefix from every section polyline.
    ///
    /// A polyline with an unknown version is removed, which later fails
    /// validation of its route.
    pub fn strip_format_versions(&mut self) {
        for section in self
            .routes
            .iter_mut()
            .filter_map(Lenient::as_valid_mut)
            .flat_map(|r| r.sections.iter_mut())
        {
            let Some(encoded) = section.polyline.take() else {
                continue;
            };
            match strip_format_version(&encoded) {
                Ok(rest) => section.polyline = Some(rest.to_owned()),
                Err(err) => warn!(error = %err, "dropping polyline with unsupported format"),
            }
        }
    }

    /// Validate every route, skipping the malformed ones
    pub fn into_routes(mut self) -> Vec<Route> {
        self.expand_refs();
        valid_units(self.routes, "route", Route::try_from)
    }
}

impl TryFrom<WireSummary> for Summary {
    type Error = ServiceError;

    fn try_from(wire: WireSummary) -> Result<Self, Self::Error> {
        if !wire.duration.is_finite() || wire.duration < 0.0 {
            return Err(ServiceError::Malformed(format!(
                "invalid duration {}",
                wire.duration
            )));
        }
        Ok(Self {
            duration: wire.duration,
            length: wire.length,
            base_duration: wire.base_duration.filter(|d| d.is_finite()),
        })
    }
}

impl TryFrom<WireAction> for Maneuver {
    type Error = ServiceError;

    fn try_from(wire: WireAction) -> Result<Self, Self::Error> {
        let offset = wire
            .offset
            .ok_or_else(|| ServiceError::Malformed(format!("{} action without offset", wire.action)))?;

        Ok(Self {
            action: wire
                .action
                .parse()
                .unwrap_or(ManeuverAction::Other(wire.action)),
            direction: wire.direction.and_then(|d| d.parse().ok()),
            turn_angle: wire.turn_angle,
            offset,
        })
    }
}

impl TryFrom<WireSection> for Section {
    type Error = ServiceError;

    fn try_from(wire: WireSection) -> Result<Self, Self::Error> {
        let polyline = wire
            .polyline
            .ok_or_else(|| ServiceError::Malformed("section without polyline".into()))?;
        let points = decode_polyline(&polyline)
            .map_err(|err| ServiceError::Malformed(format!("bad polyline: {err}")))?;
        let summary = Summary::try_from(
            wire.summary
                .ok_or_else(|| ServiceError::Malformed("section without summary".into()))?,
        )?;

        let actions = valid_units(wire.turn_by_turn_actions, "maneuver", Maneuver::try_from);

        let spans = valid_units(wire.spans, "span", |span| {
            Ok(Span {
                offset: span.offset,
                segment: span
                    .segment_ref
                    .as_ref()
                    .and_then(OneOrMany::first)
                    .and_then(SegmentId::parse),
            })
        });

        let notices = valid_units(wire.notices, "notice", |n| {
            Ok(n.code.parse().unwrap_or(NoticeCode::Other(n.code)))
        });

        Ok(Self {
            polyline,
            points,
            summary,
            actions,
            spans,
            notices,
        })
    }
}

impl TryFrom<WireRoute> for Route {
    type Error = ServiceError;

    fn try_from(wire: WireRoute) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .ok_or_else(|| ServiceError::Malformed("route without id".into()))?;
        if wire.sections.is_empty() {
            return Err(ServiceError::Malformed(format!("route {id} has no sections")));
        }

        let sections = wire
            .sections
            .into_iter()
            .map(Section::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Route::new(id, sections))
    }
}

// ============================================================================
// Traffic flow
// ============================================================================

/// Area a flow request covers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlowArea {
    Bbox {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },
}

impl From<BoundingBox> for FlowArea {
    fn from(bbox: BoundingBox) -> Self {
        Self::Bbox {
            west: bbox.west,
            south: bbox.south,
            east: bbox.east,
            north: bbox.north,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRequestBody {
    #[serde(rename = "in")]
    pub area: FlowArea,
    pub location_referencing: Vec<&'static str>,
    pub advanced_features: Vec<&'static str>,
}

impl FlowRequestBody {
    pub fn new(area: FlowArea) -> Self {
        Self {
            area,
            location_referencing: vec!["segmentRef", "shape"],
            advanced_features: vec!["deepCoverage"],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse {
    #[serde(default)]
    pub results: Vec<Lenient<WireFlowItem>>,
    #[serde(default)]
    pub ref_replacements: RefReplacements,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFlowItem {
    #[serde(default)]
    pub location: WireLocation,
    pub current_flow: WireFlow,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLocation {
    pub segment_ref: Option<WireSegmentRefs>,
    pub shape: Option<WireShape>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSegmentRefs {
    #[serde(default)]
    pub segments: Vec<Lenient<WireSegmentRef>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSegmentRef {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub length: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireShape {
    #[serde(default)]
    pub links: Vec<Lenient<WireLink>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLink {
    #[serde(default)]
    pub points: Vec<Lenient<WirePoint>>,
    pub length: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WirePoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFlow {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub free_flow: f64,
    #[serde(default)]
    pub jam_factor: f64,
    #[serde(default)]
    pub confidence: f64,
    pub traversability: Option<String>,
    #[serde(default)]
    pub sub_segments: Vec<Lenient<WireSubSegment>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSubSegment {
    pub length: f64,
    #[serde(flatten)]
    pub flow: WireFlow,
}

impl From<&WireFlow> for FlowSnapshot {
    fn from(wire: &WireFlow) -> Self {
        Self {
            speed: wire.speed,
            free_flow: wire.free_flow,
            jam_factor: wire.jam_factor,
            confidence: wire.confidence,
            traversability: wire
                .traversability
                .as_deref()
                .map(|t| t.parse().unwrap_or(Traversability::Other(t.to_owned())))
                .unwrap_or_default(),
        }
    }
}

impl From<WireLink> for ShapeLink {
    fn from(wire: WireLink) -> Self {
        let points: Vec<GeoPoint> =
            valid_units(wire.points, "shape point", |p| Ok(GeoPoint::new(p.lat, p.lng)));
        let length = wire
            .length
            .filter(|l| l.is_finite() && *l >= 0.0)
            .unwrap_or_else(|| path_length(&points));

        Self { points, length }
    }
}

impl TryFrom<WireFlowItem> for FlowItem {
    type Error = ServiceError;

    fn try_from(wire: WireFlowItem) -> Result<Self, Self::Error> {
        let refs = wire
            .location
            .segment_ref
            .ok_or_else(|| ServiceError::Malformed("flow item without segment refs".into()))?;

        let segments = refs
            .segments
            .into_iter()
            .map(|unit| match unit {
                Lenient::Valid(s) => {
                    let id = s.reference.as_deref().and_then(SegmentId::parse);
                    if id.is_none() {
                        warn!(reference = ?s.reference, "skipping unparseable segment reference");
                    }
                    SegmentRef {
                        id,
                        length: s.length.max(0.0),
                    }
                }
                Lenient::Invalid(err) => {
                    warn!(error = %err, "skipping malformed segment reference");
                    SegmentRef { id: None, length: 0.0 }
                }
            })
            .collect();

        let links = wire
            .location
            .shape
            .map(|shape| valid_units(shape.links, "shape link", |link| Ok(ShapeLink::from(link))))
            .unwrap_or_default();

        // Windows are positional, so one bad subSegment spoils the whole item
        let sub_segments = wire
            .current_flow
            .sub_segments
            .iter()
            .map(|unit| match unit {
                Lenient::Valid(sub) => Ok(SubSegmentFlow {
                    length: sub.length.max(0.0),
                    flow: FlowSnapshot::from(&sub.flow),
                }),
                Lenient::Invalid(err) => {
                    Err(ServiceError::Malformed(format!("bad subSegment: {err}")))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            segments,
            links,
            flow: FlowSnapshot::from(&wire.current_flow),
            sub_segments,
        })
    }
}

impl From<FlowResponse> for TrafficFlow {
    fn from(mut response: FlowResponse) -> Self {
        let replacements = std::mem::take(&mut response.ref_replacements);
        let items = valid_units(response.results, "flow item", |mut item| {
            if let Some(refs) = item.location.segment_ref.as_mut() {
                for reference in refs
                    .segments
                    .iter_mut()
                    .filter_map(Lenient::as_valid_mut)
                    .filter_map(|s| s.reference.as_mut())
                {
                    *reference = replacements.expand(reference).into_owned();
                }
            }
            FlowItem::try_from(item)
        });

        Self { items }
    }
}

// ============================================================================
// Vision
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DetectRequestBody {
    pub lat: f64,
    pub lon: f64,
    pub heading: f64,
    pub conf: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectResponse {
    pub stop_sign_detected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::TravelDirection;
    use crate::model::TurnDirection;
    use serde_json::json;

    #[test]
    fn test_avoid_serialization() {
        let avoid = AvoidInput {
            segments: vec![SegmentId::new(5, TravelDirection::Backward)],
            areas: vec![BoundingBox::new(2.0, 1.0, 4.0, 3.0)],
        };
        let body = serde_json::to_value(RouteRequestBody::from(&avoid)).unwrap();
        assert_eq!(
            body,
            json!({
                "avoid": {
                    "segments": ["here:cm:segment:5#-"],
                    "areas": ["bbox:3,1,4,2"],
                }
            })
        );

        let empty = serde_json::to_value(RouteRequestBody::from(&AvoidInput::default())).unwrap();
        assert_eq!(empty, json!({}));
    }

    #[test]
    fn test_route_response_validation() {
        let response: RouteResponse = serde_json::from_value(json!({
            "routes": [
                {
                    "id": "good",
                    "sections": [{
                        "polyline": "Foz5xJ67i1B1B7PzIhaxL7Y",
                        "summary": { "duration": 600, "length": 1200, "baseDuration": 500 },
                        "turnByTurnActions": [
                            { "action": "depart", "offset": 0 },
                            { "action": "turn", "direction": "left", "turnAngle": -75.5, "offset": 2 },
                            { "action": "turn", "direction": "right" }
                        ],
                        "spans": [
                            { "offset": 0, "segmentRef": "$0:1:$1:123#+0..1" },
                            { "offset": 1, "segmentRef": ["here:cm:segment:456#-"] },
                            { "offset": 2 }
                        ],
                        "notices": [{ "code": "violatedBlockedRoad" }]
                    }]
                },
                { "id": "no-polyline", "sections": [{ "summary": { "duration": 1, "length": 1 } }] },
                { "sections": [] }
            ],
            "refReplacements": { "0": "hrn:here:data::olp-here:rib-2:5447:", "1": "here:cm:segment" }
        }))
        .unwrap();

        let routes = response.into_routes();
        assert_eq!(routes.len(), 1);

        let section = &routes[0].sections[0];
        assert_eq!(section.points.len(), 4);
        assert_eq!(section.summary.base_duration, Some(500.0));
        // The action without an offset is dropped, the rest survive
        assert_eq!(section.actions.len(), 2);
        assert_eq!(section.actions[1].action, ManeuverAction::Turn);
        assert_eq!(section.actions[1].direction, Some(TurnDirection::Left));
        assert_eq!(
            section.spans[0].segment,
            Some(SegmentId::new(123, TravelDirection::Forward))
        );
        assert_eq!(
            section.spans[1].segment,
            Some(SegmentId::new(456, TravelDirection::Backward))
        );
        assert_eq!(section.spans[2].segment, None);
        assert!(routes[0].has_notice(&NoticeCode::ViolatedBlockedRoad));
    }

    #[test]
    fn test_strip_format_versions() {
        let mut response: RouteResponse = serde_json::from_value(json!({
            "routes": [
                { "id": "a", "sections": [{
                    "polyline": "BFoz5xJ67i1B1B7PzIhaxL7Y",
                    "summary": { "duration": 60, "length": 500 }
                }]},
                { "id": "b", "sections": [{
                    "polyline": "CFoz5xJ67i1B1B7PzIhaxL7Y",
                    "summary": { "duration": 60, "length": 500 }
                }]}
            ]
        }))
        .unwrap();

        response.strip_format_versions();
        let routes = response.into_routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].sections[0].polyline, "Foz5xJ67i1B1B7PzIhaxL7Y");
    }

    #[test]
    fn test_flow_response_validation() {
        let response: FlowResponse = serde_json::from_value(json!({
            "results": [
                {
                    "location": {
                        "segmentRef": { "segments": [
                            { "ref": "$0:1:$1:10#+", "length": 50 },
                            { "ref": "garbage", "length": 25 }
                        ]},
                        "shape": { "links": [
                            { "points": [{ "lat": 0.0, "lng": 0.0 }, { "lat": 0.0, "lng": 0.001 }] }
                        ]}
                    },
                    "currentFlow": {
                        "speed": 3.0, "freeFlow": 12.0, "jamFactor": 7.5, "confidence": 0.8,
                        "traversability": "open",
                        "subSegments": [
                            { "length": 50, "speed": 2.0, "freeFlow": 12.0, "jamFactor": 9.0,
                              "confidence": 0.6, "traversability": "closed" }
                        ]
                    }
                },
                {
                    "location": {},
                    "currentFlow": { "jamFactor": 10 }
                }
            ],
            "refReplacements": { "0": "hrn:x:", "1": "here:cm:segment" }
        }))
        .unwrap();

        let flow = TrafficFlow::from(response);
        assert_eq!(flow.items.len(), 1);

        let item = &flow.items[0];
        assert_eq!(item.segments[0].id, Some(SegmentId::new(10, TravelDirection::Forward)));
        assert_eq!(item.segments[1].id, None);
        assert_eq!(item.segments[1].length, 25.0);

        // Missing link length is measured from the points (~111 m)
        assert!((item.links[0].length - 111.19).abs() < 0.1);

        assert_eq!(item.sub_segments.len(), 1);
        assert_eq!(item.sub_segments[0].flow.traversability, Traversability::Closed);
        assert_eq!(item.flow.jam_factor, 7.5);
    }

    #[test]
    fn test_bad_route_units_do_not_sink_the_response() {
        let response: RouteResponse = serde_json::from_value(json!({
            "routes": [
                {
                    "id": "kept",
                    "sections": [{
                        "polyline": "Foz5xJ67i1B1B7PzIhaxL7Y",
                        "summary": { "duration": 600 },
                        "turnByTurnActions": [
                            { "direction": "left", "offset": 1 },
                            { "action": "turn", "direction": "left", "turnAngle": -80, "offset": 2 }
                        ],
                        "spans": [{ "segmentRef": "here:cm:segment:1#+" }, { "offset": 0 }],
                        "notices": [{ "title": "no code" }, { "code": "violatedBlockedRoad" }]
                    }]
                },
                { "id": "wrong-shape", "sections": "not a list" },
                42
            ]
        }))
        .unwrap();

        let routes = response.into_routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id.as_str(), "kept");

        let section = &routes[0].sections[0];
        assert_eq!(section.summary.length, 0.0);
        assert_eq!(section.actions.len(), 1);
        assert_eq!(section.actions[0].offset, 2);
        assert_eq!(section.spans.len(), 1);
        assert_eq!(section.notices, vec![NoticeCode::ViolatedBlockedRoad]);
    }

    #[test]
    fn test_bad_flow_units_do_not_sink_the_response() {
        let response: FlowResponse = serde_json::from_value(json!({
            "results": [
                {
                    "location": {
                        "segmentRef": { "segments": [
                            { "ref": "here:cm:segment:7#+", "length": 40 },
                            { "length": 30 },
                            { "ref": 99 }
                        ]},
                        "shape": { "links": [
                            { "points": [{ "lat": 0.0, "lng": 0.0 }, { "lat": 0.0 }, { "lat": 0.0, "lng": 0.001 }] },
                            { "points": "nope" }
                        ]}
                    },
                    "currentFlow": { "jamFactor": 8.0 }
                },
                {
                    "location": { "segmentRef": { "segments": [{ "ref": "here:cm:segment:8#+", "length": 10 }] } },
                    "currentFlow": { "jamFactor": 8.0, "subSegments": [{ "jamFactor": 9.0 }] }
                },
                { "location": { "segmentRef": { "segments": [] } } }
            ]
        }))
        .unwrap();

        let flow = TrafficFlow::from(response);
        assert_eq!(flow.items.len(), 1);

        let item = &flow.items[0];
        assert_eq!(item.segments.len(), 3);
        assert_eq!(item.segments[0].id, Some(SegmentId::new(7, TravelDirection::Forward)));
        // A reference without `ref` keeps its length for the cumulative walk
        assert_eq!(item.segments[1].id, None);
        assert_eq!(item.segments[1].length, 30.0);
        assert_eq!(item.segments[2].length, 0.0);

        assert_eq!(item.links.len(), 1);
        assert_eq!(item.links[0].points.len(), 2);
    }

    #[test]
    fn test_flow_request_body() {
        let body = FlowRequestBody::new(BoundingBox::new(2.0, 1.0, 4.0, 3.0).into());
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "in": { "type": "bbox", "west": 3.0, "south": 1.0, "east": 4.0, "north": 2.0 },
                "locationReferencing": ["segmentRef", "shape"],
                "advancedFeatures": ["deepCoverage"]
            })
        );
    }
}
