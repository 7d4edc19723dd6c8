//! # detour-geometry
//!
//! Geometry kernel for route refinement on WGS84 coordinates.
//!
//! ## Features
//!
//! - **Flexible polylines**: precision-configurable codec with optional third dimension
//! - **Spherical math**: Haversine distance, forward azimuth, point offsets
//! - **Bounding boxes**: creation around a point, merging with margin, overlap tests
//! - **Proximity queries**: R-tree edge index for "is this point near the polyline"
//!
//! ## Example
//!
//! ```
//! use detour_geometry::prelude::*;
//!
//! let route = vec![
//!     GeoPoint::new(52.5200, 13.4050),
//!     GeoPoint::new(52.5205, 13.4100),
//!     GeoPoint::new(52.5230, 13.4120),
//! ];
//!
//! let encoded = encode_polyline(&route, 5).unwrap();
//! let decoded = decode_polyline(&encoded).unwrap();
//! assert_eq!(decoded.len(), 3);
//!
//! // A point a few metres off the first edge is "on" the route
//! let index = EdgeIndex::from_points(&decoded);
//! assert!(index.any_within(GeoPoint::new(52.52021, 13.4070), 20.0));
//! ```

pub mod bbox;
pub mod point;
pub mod polyline;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::bbox::{merge_boxes, BoundingBox, MERGE_MARGIN_DEGREES};
    pub use crate::point::GeoPoint;
    pub use crate::polyline::{
        decode_polyline, encode_polyline, strip_format_version,
        FlexPolyline, Header, PolylineError, ThirdDimension,
    };
    pub use crate::spatial::index::EdgeIndex;
    pub use crate::spatial::queries::{
        bearing_degrees, distance_meters, distance_point_to_segment, path_length, point_behind,
    };
}

pub use prelude::*;
