//! Traffic flow to prioritized congested segments.

pub mod cache;
pub mod extract;

pub use cache::TrafficCache;
pub use extract::{extract_item, extract_segments, priority};
