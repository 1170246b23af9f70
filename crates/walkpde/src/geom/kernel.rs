//! Distance, silhouette and ray queries against polylines.

use super::types::{GeomCfg, Point2, Polyline};

/// Scalar cross product `u × v` (z-component of the 3D cross product).
#[inline]
pub fn cross(u: Point2, v: Point2) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Rotate by +90° (counter-clockwise).
#[inline]
pub fn rot90(v: Point2) -> Point2 {
    Point2::new(-v.y, v.x)
}

/// Closest point on the segment `[a, b]` to `x`.
///
/// Uses the clamped scalar projection `t = clamp((x-a)·u / u·u, 0, 1)` with
/// `u = b - a`, so feet outside the segment snap to the nearer endpoint.
#[inline]
pub fn project_onto_segment(x: Point2, a: Point2, b: Point2) -> Point2 {
    let u = b - a;
    let uu = u.dot(&u);
    if uu <= 0.0 {
        return a;
    }
    let t = ((x - a).dot(&u) / uu).clamp(0.0, 1.0);
    a * (1.0 - t) + b * t
}

/// Closest point on any segment of `polylines`, with its distance.
///
/// `None` for an empty set.
pub fn closest_point_on_polylines(x: Point2, polylines: &[Polyline]) -> Option<(Point2, f64)> {
    let mut best: Option<(Point2, f64)> = None;
    for seg in polylines.iter().flat_map(|p| p.segments()) {
        let y = project_onto_segment(x, seg.a, seg.b);
        let d = (x - y).norm();
        if best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((y, d));
        }
    }
    best
}

/// Distance from `x` to the closest point on `polylines` (`+∞` if empty).
#[inline]
pub fn distance_to_polylines(x: Point2, polylines: &[Polyline]) -> f64 {
    closest_point_on_polylines(x, polylines).map_or(f64::INFINITY, |(_, d)| d)
}

/// True if vertex `b` of the chain `a → b → c` is a silhouette as seen from `x`.
///
/// That is the case when `x` lies in front of exactly one of the two edges:
/// the signs of `(b-a) × (x-a)` and `(c-b) × (x-b)` differ. Collinear chains
/// never qualify.
#[inline]
pub fn is_silhouette(a: Point2, b: Point2, c: Point2, x: Point2) -> bool {
    cross(b - a, x - a) * cross(c - b, x - b) < 0.0
}

/// Distance from `x` to the closest silhouette vertex of `polylines` (`+∞` if none).
pub fn silhouette_distance(x: Point2, polylines: &[Polyline]) -> f64 {
    polylines
        .iter()
        .flat_map(|p| p.corners())
        .filter(|&(a, b, c)| is_silhouette(a, b, c, x))
        .map(|(_, b, _)| (x - b).norm())
        .fold(f64::INFINITY, f64::min)
}

/// Hit time `t` of the ray `x + t v` against the segment `[a, b]`.
///
/// Solves `x + t v = a + s (b - a)` by cross products. Valid hits need
/// `t > 0` and `s ∈ [0, 1]`; anything else (including rays parallel to the
/// segment within `eps_det`) is `+∞`.
#[inline]
pub fn ray_intersect(x: Point2, v: Point2, a: Point2, b: Point2, eps_det: f64) -> f64 {
    let u = b - a;
    let w = x - a;
    let d = cross(v, u);
    if d.abs() <= eps_det {
        return f64::INFINITY;
    }
    let s = cross(v, w) / d;
    let t = cross(u, w) / d;
    if t > 0.0 && (0.0..=1.0).contains(&s) {
        t
    } else {
        f64::INFINITY
    }
}

/// Result of casting a ray inside a ball.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Point2,
    /// Unit normal of the segment that was hit; `None` when the ray ran to the ball's edge.
    pub normal: Option<Point2>,
}

impl RayHit {
    #[inline]
    pub fn on_boundary(&self) -> bool {
        self.normal.is_some()
    }
}

/// First intersection of the ray `x + t v` with `polylines`, clipped to the ball of radius `r`.
///
/// `v` must be a unit vector. The ray origin is pushed by `cfg.ray_offset`
/// along `v` so a walk resting on a segment does not hit it again at `t ≈ 0`.
pub fn first_hit(x: Point2, v: Point2, r: f64, polylines: &[Polyline], cfg: &GeomCfg) -> RayHit {
    let origin = x + v * cfg.ray_offset;
    let mut t_min = r;
    let mut normal = None;
    for seg in polylines.iter().flat_map(|p| p.segments()) {
        let t = ray_intersect(origin, v, seg.a, seg.b, cfg.eps_det);
        if t < t_min {
            t_min = t;
            let n = rot90(seg.direction());
            normal = Some(n / n.norm());
        }
    }
    RayHit {
        point: x + v * t_min,
        normal,
    }
}
