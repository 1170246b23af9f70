//! Walk-on-Stars for mixed Dirichlet / zero-Neumann problems in the plane.
//!
//! State machine
//! - Interior: the next direction is uniform over the full circle.
//! - On a reflecting segment (normal `n` recorded): the direction is drawn
//!   from the half-circle around `n`, `θ' = θ/2 + arg(n)` with `θ ∈ [-π, π)`.
//! - Either way the ray runs until it meets a Neumann segment (walker lands
//!   on the boundary, normal recorded) or the star radius (walker is back in
//!   the interior).
//! - The star radius is `max(rMin, min(d_Dirichlet, d_silhouette))`, so the
//!   segment of ray inside it never crosses the Dirichlet boundary and never
//!   passes behind a silhouette vertex.

use std::f64::consts::PI;

use rand::Rng;

use super::{StepRadius, StepStrategy, WalkState};
use crate::boundary::{Absorbing, Boundary};
use crate::config::EstimatorConfig;
use crate::error::SolveError;
use crate::geom::{distance_to_polylines, first_hit, silhouette_distance, Point2};
use crate::problem::ScalarField;

/// Direction angle of a reflecting step for the uniform draw `theta ∈ [-π, π)`.
///
/// The result lies in `[arg(n) - π/2, arg(n) + π/2)` and is not wrapped back
/// into `[-π, π)`; it is only ever fed to `cos`/`sin`.
#[inline]
pub fn hemisphere_angle(theta: f64, normal: Point2) -> f64 {
    theta / 2.0 + normal.y.atan2(normal.x)
}

pub struct WalkOnStars<'a, G> {
    boundary: &'a Boundary,
    g: &'a G,
    epsilon: f64,
    r_min: f64,
}

impl<'a, G> WalkOnStars<'a, G>
where
    G: ScalarField<Point2>,
{
    pub fn new(
        boundary: &'a Boundary,
        g: &'a G,
        cfg: &EstimatorConfig,
    ) -> Result<Self, SolveError> {
        cfg.validate()?;
        if boundary.dirichlet().is_empty() {
            return Err(SolveError::domain(
                "walk on stars needs at least one Dirichlet polyline to absorb on",
            ));
        }
        Ok(Self {
            boundary,
            g,
            epsilon: cfg.epsilon,
            r_min: cfg.r_min,
        })
    }
}

impl<'a, G> StepStrategy for WalkOnStars<'a, G>
where
    G: ScalarField<Point2>,
{
    type Position = Point2;

    fn next_radius(&self, state: &WalkState<Point2>) -> StepRadius {
        let x = state.position;
        let d_dirichlet = distance_to_polylines(x, self.boundary.dirichlet());
        let d_silhouette = silhouette_distance(x, self.boundary.neumann());
        StepRadius {
            radius: self.r_min.max(d_dirichlet.min(d_silhouette)),
            absorbing_distance: d_dirichlet,
        }
    }

    #[inline]
    fn is_absorbed(&self, _state: &WalkState<Point2>, radius: &StepRadius) -> bool {
        radius.absorbing_distance < self.epsilon
    }

    fn sample_next_point<R: Rng + ?Sized>(
        &self,
        state: &mut WalkState<Point2>,
        radius: &StepRadius,
        rng: &mut R,
    ) {
        let mut theta = rng.gen_range(-PI..PI);
        if let Some(n) = state.normal {
            theta = hemisphere_angle(theta, n);
        }
        let v = Point2::new(theta.cos(), theta.sin());
        let hit = first_hit(
            state.position,
            v,
            radius.radius,
            self.boundary.neumann(),
            self.boundary.geom(),
        );
        state.position = hit.point;
        state.normal = hit.normal;
    }

    #[inline]
    fn boundary_value(&self, state: &WalkState<Point2>) -> f64 {
        self.g.value(self.boundary.closest_point(state.position))
    }
}
