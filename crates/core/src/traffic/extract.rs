//! Congested segment extraction from traffic flow items.
//!
//! A flow item lists its topology references in travel order, each with a
//! length. Sub-segments split the same stretch into flow windows by length.
//! Both lists, and the optional shape links, are aligned by walking
//! cumulative lengths; nothing is matched by id.

use detour_geometry::GeoPoint;
use itertools::Itertools;
use tracing::trace;

use crate::identifiers::SegmentId;
use crate::model::{DataSource, FlowItem, FlowSnapshot, PrioritizedSegment, TrafficFlow};

/// Distance from the middle of a run of `count` segments, floored.
///
/// Segments at either end of a run get the highest value so they are the
/// last to be dropped when an avoid list is truncated.
pub fn priority(index: usize, count: usize) -> u32 {
    let middle = (count as f64 - 1.0) / 2.0;
    (index as f64 - middle).abs().floor() as u32
}

/// Congested segments of a whole flow response, first occurrence of each id kept
pub fn extract_segments(flow: &TrafficFlow, jam_threshold: f64) -> Vec<PrioritizedSegment> {
    flow.items
        .iter()
        .flat_map(|item| extract_item(item, jam_threshold))
        .unique_by(|segment| segment.id)
        .collect()
}

/// Congested segments of one flow item
pub fn extract_item(item: &FlowItem, jam_threshold: f64) -> Vec<PrioritizedSegment> {
    if item.segments.is_empty() {
        return Vec::new();
    }

    let shapes = assign_shapes(item);

    if item.sub_segments.is_empty() {
        if !item.flow.is_congested(jam_threshold) {
            return Vec::new();
        }
        return whole_item(item, &shapes);
    }

    if item
        .sub_segments
        .iter()
        .all(|sub| sub.flow.is_congested(jam_threshold))
    {
        return whole_item(item, &shapes);
    }

    congested_runs(item, &shapes, jam_threshold)
}

/// Every reference, prioritized over the whole list, with the item-level flow
fn whole_item(item: &FlowItem, shapes: &[Option<Vec<GeoPoint>>]) -> Vec<PrioritizedSegment> {
    let count = item.segments.len();
    item.segments
        .iter()
        .enumerate()
        .filter_map(|(i, segment)| {
            let id = segment.id?;
            Some(build_segment(
                id,
                priority(i, count),
                segment.length,
                &item.flow,
                shapes[i].clone(),
            ))
        })
        .collect()
}

/// Index of the sub-segment window each reference starts in.
///
/// One forward pass over both lists; references starting past the last
/// window belong to the last window.
fn assign_windows(item: &FlowItem) -> Vec<usize> {
    let last = item.sub_segments.len().saturating_sub(1);
    let mut owners = Vec::with_capacity(item.segments.len());

    let mut window = 0;
    let mut window_end = item.sub_segments.first().map_or(0.0, |sub| sub.length);
    let mut position = 0.0;

    for segment in &item.segments {
        while window < last && position >= window_end {
            window += 1;
            window_end += item.sub_segments[window].length;
        }
        owners.push(window);
        position += segment.length;
    }

    owners
}

/// References owned by congested windows, prioritized within each maximal run
fn congested_runs(
    item: &FlowItem,
    shapes: &[Option<Vec<GeoPoint>>],
    jam_threshold: f64,
) -> Vec<PrioritizedSegment> {
    let owners = assign_windows(item);
    let congested: Vec<bool> = owners
        .iter()
        .map(|&w| item.sub_segments[w].flow.is_congested(jam_threshold))
        .collect();

    let mut results = Vec::new();
    let mut start = 0;
    while start < congested.len() {
        if !congested[start] {
            start += 1;
            continue;
        }

        let end = (start..congested.len())
            .find(|&i| !congested[i])
            .unwrap_or(congested.len());
        let run_len = end - start;
        trace!(start, run_len, "congested run");

        for i in start..end {
            let Some(id) = item.segments[i].id else {
                continue;
            };
            let flow = &item.sub_segments[owners[i]].flow;
            results.push(build_segment(
                id,
                priority(i - start, run_len),
                item.segments[i].length,
                flow,
                shapes[i].clone(),
            ));
        }

        start = end;
    }

    results
}

/// Shape points for each reference, taken from every link overlapping it.
///
/// A link spanning a reference boundary contributes its points to both sides.
fn assign_shapes(item: &FlowItem) -> Vec<Option<Vec<GeoPoint>>> {
    let links = &item.links;
    if links.is_empty() {
        return vec![None; item.segments.len()];
    }

    let mut shapes = Vec::with_capacity(item.segments.len());
    let mut first_link = 0;
    let mut first_link_start = 0.0;
    let mut segment_start = 0.0;

    for segment in &item.segments {
        let segment_end = segment_start + segment.length;

        // Links that end before this reference starts are done for good
        while first_link < links.len()
            && first_link_start + links[first_link].length <= segment_start
            && first_link + 1 < links.len()
        {
            first_link_start += links[first_link].length;
            first_link += 1;
        }

        let mut points: Vec<GeoPoint> = Vec::new();
        let mut link = first_link;
        let mut link_start = first_link_start;
        while link < links.len() && (link == first_link || link_start < segment_end) {
            if link_start + links[link].length >= segment_start {
                points.extend_from_slice(&links[link].points);
            }
            link_start += links[link].length;
            link += 1;
        }

        points.dedup();
        shapes.push((!points.is_empty()).then_some(points));
        segment_start = segment_end;
    }

    shapes
}

fn build_segment(
    id: SegmentId,
    priority: u32,
    length: f64,
    flow: &FlowSnapshot,
    shape: Option<Vec<GeoPoint>>,
) -> PrioritizedSegment {
    PrioritizedSegment {
        id,
        priority,
        shape,
        length,
        speed: flow.speed,
        free_flow: flow.free_flow,
        jam_factor: flow.jam_factor,
        data_source: DataSource::from_confidence(flow.confidence),
    }
}
