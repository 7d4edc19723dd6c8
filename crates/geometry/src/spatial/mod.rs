//! Spatial indexing and query utilities.

pub mod index;
pub mod queries;

pub use queries::{distance_meters, distance_point_to_segment};
