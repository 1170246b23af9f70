//! Winding-number containment for counter-clockwise polyline domains.

use super::kernel::cross;
use super::types::{Point2, Polyline};
use crate::boundary::Boundary;

/// Total signed angle subtended by `polylines` as seen from `x`.
///
/// Each segment contributes `arg((b - x) / (a - x))`, the signed angle swept
/// from `a` to `b` around `x`.
pub fn signed_angle(x: Point2, polylines: &[Polyline]) -> f64 {
    polylines
        .iter()
        .flat_map(|p| p.segments())
        .map(|seg| {
            let u = seg.a - x;
            let w = seg.b - x;
            cross(u, w).atan2(u.dot(&w))
        })
        .sum()
}

/// True if the Dirichlet and Neumann polylines of `boundary` wind around `x` exactly once.
///
/// Assumes both sets together form closed, counter-clockwise loops.
pub fn inside_domain(x: Point2, boundary: &Boundary) -> bool {
    let theta = signed_angle(x, boundary.dirichlet()) + signed_angle(x, boundary.neumann());
    (theta - std::f64::consts::TAU).abs() < boundary.geom().winding_tol
}
