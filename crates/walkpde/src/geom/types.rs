//! Basic planar types and tolerances.
//!
//! - `GeomCfg`: centralizes the epsilons of the kernel (parallel rays, ray
//!   offset, winding tolerance, shortest admissible segment).
//! - `Segment`, `Polyline`: validated boundary pieces.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::SolveError;

/// A point (or direction) in the plane.
pub type Point2 = Vector2<f64>;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeomCfg {
    /// Rays whose cross product with a segment is below this are treated as parallel.
    pub eps_det: f64,
    /// Offset applied to ray origins so a walk resting on a segment does not re-hit it.
    pub ray_offset: f64,
    /// Accepted deviation of the total winding angle from 2π.
    pub winding_tol: f64,
    /// Segments shorter than this are rejected as degenerate.
    pub min_segment_len: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_det: 1e-12,
            ray_offset: 1e-5,
            winding_tol: 1e-4,
            min_segment_len: 1e-12,
        }
    }
}

impl GeomCfg {
    pub const fn with_eps_det(self, eps_det: f64) -> Self {
        Self { eps_det, ..self }
    }
    pub const fn with_ray_offset(self, ray_offset: f64) -> Self {
        Self { ray_offset, ..self }
    }
    pub const fn with_winding_tol(self, winding_tol: f64) -> Self {
        Self { winding_tol, ..self }
    }
    pub const fn with_min_segment_len(self, min_segment_len: f64) -> Self {
        Self {
            min_segment_len,
            ..self
        }
    }

    /// Every tolerance must be finite and > 0.
    pub fn validate(&self) -> Result<(), SolveError> {
        let fields = [
            ("eps_det", self.eps_det),
            ("ray_offset", self.ray_offset),
            ("winding_tol", self.winding_tol),
            ("min_segment_len", self.min_segment_len),
        ];
        for (name, v) in fields {
            if !(v.is_finite() && v > 0.0) {
                return Err(SolveError::config(format!(
                    "{name} must be finite and > 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Directed segment `a → b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Point2,
    pub b: Point2,
}

impl Segment {
    #[inline]
    pub fn new(a: Point2, b: Point2) -> Self {
        Self { a, b }
    }
    #[inline]
    pub fn direction(&self) -> Point2 {
        self.b - self.a
    }
    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }
}

/// Ordered chain of connected segments.
///
/// Invariants:
/// - At least two points, all finite.
/// - No segment shorter than `GeomCfg::min_segment_len`.
/// - Closed iff the last point repeats the first one.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    points: Vec<Point2>,
}

impl Polyline {
    /// Validate with the default tolerances.
    pub fn new(points: Vec<Point2>) -> Result<Self, SolveError> {
        Self::with_cfg(points, &GeomCfg::default())
    }

    pub fn with_cfg(points: Vec<Point2>, cfg: &GeomCfg) -> Result<Self, SolveError> {
        cfg.validate()?;
        if points.len() < 2 {
            return Err(SolveError::degenerate(format!(
                "polyline needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(k) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(SolveError::degenerate(format!(
                "polyline point {k} is not finite"
            )));
        }
        for (k, w) in points.windows(2).enumerate() {
            if (w[1] - w[0]).norm() < cfg.min_segment_len {
                return Err(SolveError::degenerate(format!(
                    "polyline segment {k} has zero length"
                )));
            }
        }
        Ok(Self { points })
    }

    /// Closed polyline through `vertices`, repeating the first vertex at the end.
    pub fn closed(mut vertices: Vec<Point2>) -> Result<Self, SolveError> {
        if let Some(&first) = vertices.first() {
            vertices.push(first);
        }
        Self::new(vertices)
    }

    #[inline]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points[0] == self.points[self.points.len() - 1]
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    /// Vertex triples `(a, b, c)` around every vertex `b` that has two neighbours.
    ///
    /// For a closed polyline this includes the closing vertex.
    pub fn corners(&self) -> impl Iterator<Item = (Point2, Point2, Point2)> + '_ {
        let p = &self.points;
        let n = p.len();
        let closing = if self.is_closed() {
            Some((p[n - 2], p[0], p[1]))
        } else {
            None
        };
        p.windows(3).map(|w| (w[0], w[1], w[2])).chain(closing)
    }
}
