//! Planar geometry kernel for polyline boundaries.
//!
//! Purpose
//! - Closest-point queries, silhouette tests and ray casts against sets of
//!   polylines, which is everything Walk-on-Spheres and Walk-on-Stars ask of
//!   the boundary.
//! - Winding-number containment, used by the raster evaluator to skip points
//!   outside the domain.
//!
//! Conventions
//! - Points are `nalgebra::Vector2<f64>` (alias `Point2`).
//! - Closed domains are described by counter-clockwise polylines; normals are
//!   the 90° counter-clockwise rotation of the segment direction, so for CCW
//!   winding they point into the domain.
//! - Every "no hit" / "no candidate" answer is `f64::INFINITY`, never `NaN`.

mod kernel;
mod types;
mod winding;

pub use kernel::{
    closest_point_on_polylines, cross, distance_to_polylines, first_hit, is_silhouette,
    project_onto_segment, ray_intersect, rot90, silhouette_distance, RayHit,
};
pub use types::{GeomCfg, Point2, Polyline, Segment};
pub use winding::{inside_domain, signed_angle};

#[cfg(test)]
mod tests;
