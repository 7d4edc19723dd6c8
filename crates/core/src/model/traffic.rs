//! Traffic flow as reported by the provider, and the segments derived from it.

use detour_geometry::{BoundingBox, GeoPoint};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::identifiers::SegmentId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Traversability {
    #[default]
    Open,
    Closed,
    ReversibleNotRoutable,
    #[strum(default)]
    Other(String),
}

/// Speeds in m/s, jam factor on the provider's 0 (free) to 10 (standstill) scale
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowSnapshot {
    pub speed: f64,
    pub free_flow: f64,
    pub jam_factor: f64,
    pub confidence: f64,
    pub traversability: Traversability,
}

impl FlowSnapshot {
    pub fn is_congested(&self, jam_threshold: f64) -> bool {
        self.jam_factor >= jam_threshold || self.traversability == Traversability::Closed
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubSegmentFlow {
    pub length: f64,
    pub flow: FlowSnapshot,
}

/// One topology reference of a flow item; `id` is `None` when the reference
/// could not be parsed, but its length still counts for the cumulative walk
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRef {
    pub id: Option<SegmentId>,
    pub length: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeLink {
    pub points: Vec<GeoPoint>,
    pub length: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowItem {
    pub segments: Vec<SegmentRef>,
    pub links: Vec<ShapeLink>,
    pub flow: FlowSnapshot,
    pub sub_segments: Vec<SubSegmentFlow>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrafficFlow {
    pub items: Vec<FlowItem>,
}

/// Where a flow reading came from, judged by the provider's confidence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum DataSource {
    Realtime,
    Historical,
    SpeedLimit,
}

impl DataSource {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            Self::Realtime
        } else if confidence > 0.5 {
            Self::Historical
        } else {
            Self::SpeedLimit
        }
    }
}

/// Congested road segment, ranked for inclusion in an avoid request
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedSegment {
    pub id: SegmentId,
    /// Higher survives truncation longer
    pub priority: u32,
    pub shape: Option<Vec<GeoPoint>>,
    pub length: f64,
    pub speed: f64,
    pub free_flow: f64,
    pub jam_factor: f64,
    pub data_source: DataSource,
}

impl PrioritizedSegment {
    pub fn shape_bounds(&self) -> Option<BoundingBox> {
        self.shape
            .as_deref()
            .and_then(|points| BoundingBox::of_points(points.iter().copied()))
    }

    /// Extra traversal time over free flow, zero when speeds are unusable
    pub fn delay_seconds(&self) -> f64 {
        if self.speed <= 0.0 || self.free_flow <= 0.0 {
            return 0.0;
        }
        (self.length / self.speed - self.length / self.free_flow).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::TravelDirection;

    #[test]
    fn test_data_source_thresholds() {
        assert_eq!(DataSource::from_confidence(0.9), DataSource::Realtime);
        assert_eq!(DataSource::from_confidence(0.7), DataSource::Historical);
        assert_eq!(DataSource::from_confidence(0.5), DataSource::SpeedLimit);
        assert_eq!(DataSource::SpeedLimit.to_string(), "speedLimit");
    }

    #[test]
    fn test_congestion() {
        let mut flow = FlowSnapshot {
            jam_factor: 4.9,
            ..Default::default()
        };
        assert!(!flow.is_congested(5.0));

        flow.jam_factor = 5.0;
        assert!(flow.is_congested(5.0));

        flow.jam_factor = 0.0;
        flow.traversability = "closed".parse().unwrap();
        assert!(flow.is_congested(5.0));
    }

    #[test]
    fn test_segment_delay() {
        let mut segment = PrioritizedSegment {
            id: SegmentId::new(1, TravelDirection::Forward),
            priority: 0,
            shape: None,
            length: 100.0,
            speed: 5.0,
            free_flow: 10.0,
            jam_factor: 8.0,
            data_source: DataSource::Realtime,
        };
        assert_eq!(segment.delay_seconds(), 10.0);

        segment.speed = 0.0;
        assert_eq!(segment.delay_seconds(), 0.0);

        // Faster than free flow never yields negative delay
        segment.speed = 20.0;
        assert_eq!(segment.delay_seconds(), 0.0);
    }
}
