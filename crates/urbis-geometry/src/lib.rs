//! Planar geometry primitives for road network synthesis.
//!
//! Everything here is a pure function over `glam::DVec2`: segment intersection and
//! projection, rectangle clipping, polygon centroids and the mapping between the
//! generation plane and the renderer's world space.

mod polygon;
mod rect;
mod segment;
mod transform;

pub use polygon::{
    chain_rings, crosses_none, mean_point, polygon_centroid, polygon_contains, sort_by_angle,
};
pub use rect::Rect;
pub use segment::{
    Projection, Segment, line_intersection, point_segment_distance, point_segment_projection,
    segment_intersection,
};
pub use transform::PlaneTransform;

/// Rotate `v` counter-clockwise by `degrees`.
pub fn rotate_degrees(v: glam::DVec2, degrees: f64) -> glam::DVec2 {
    glam::DVec2::from_angle(degrees.to_radians()).rotate(v)
}
