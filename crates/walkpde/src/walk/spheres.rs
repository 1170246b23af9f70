//! Walk-on-Spheres for pure Dirichlet problems in the plane.

use std::f64::consts::{PI, TAU};

use rand::Rng;

use super::{StepRadius, StepStrategy, WalkState};
use crate::boundary::Absorbing;
use crate::config::EstimatorConfig;
use crate::error::SolveError;
use crate::geom::Point2;
use crate::problem::ScalarField;

/// Dirichlet Green's function of the disk of radius `big_r`, at distance `r` from its centre.
///
/// `G(r, R) = ln(R / r) / 2π`, continued by `G(0, R) = 0`.
#[inline]
pub fn green_disk(r: f64, big_r: f64) -> f64 {
    if r <= 0.0 {
        0.0
    } else {
        (big_r / r).ln() / TAU
    }
}

/// Walk-on-Spheres: jump to a uniform point on the largest empty circle until within `ε`.
///
/// With a source, each step also draws one point `y` uniformly in the disk and
/// accumulates `π R² f(y) G(|y - x|, R)`.
pub struct WalkOnSpheres<'a, B, F, G> {
    boundary: &'a B,
    f: &'a F,
    g: &'a G,
    epsilon: f64,
}

impl<'a, B, F, G> WalkOnSpheres<'a, B, F, G>
where
    B: Absorbing,
    F: ScalarField<Point2>,
    G: ScalarField<Point2>,
{
    pub fn new(
        boundary: &'a B,
        f: &'a F,
        g: &'a G,
        cfg: &EstimatorConfig,
    ) -> Result<Self, SolveError> {
        cfg.validate()?;
        boundary.check_absorbing()?;
        Ok(Self {
            boundary,
            f,
            g,
            epsilon: cfg.epsilon,
        })
    }
}

/// Uniform point in the disk of radius `r` around `x`.
#[inline]
fn sample_disk<R: Rng + ?Sized>(x: Point2, r: f64, rng: &mut R) -> Point2 {
    let rho = r * rng.gen::<f64>().sqrt();
    let theta = rng.gen::<f64>() * TAU;
    x + Point2::new(theta.cos(), theta.sin()) * rho
}

impl<'a, B, F, G> StepStrategy for WalkOnSpheres<'a, B, F, G>
where
    B: Absorbing,
    F: ScalarField<Point2>,
    G: ScalarField<Point2>,
{
    type Position = Point2;

    #[inline]
    fn next_radius(&self, state: &WalkState<Point2>) -> StepRadius {
        let d = self.boundary.distance(state.position);
        StepRadius {
            radius: d,
            absorbing_distance: d,
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
        let x = state.position;
        let big_r = radius.radius;
        if !self.f.vanishes() {
            let y = sample_disk(x, big_r, rng);
            let r = (y - x).norm();
            state.source_integral += PI * big_r * big_r * self.f.value(y) * green_disk(r, big_r);
        }
        let theta = rng.gen::<f64>() * TAU;
        state.position = x + Point2::new(theta.cos(), theta.sin()) * big_r;
    }

    #[inline]
    fn boundary_value(&self, state: &WalkState<Point2>) -> f64 {
        self.g.value(self.boundary.closest_point(state.position))
    }
}
