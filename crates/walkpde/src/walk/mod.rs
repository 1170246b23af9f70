//! Random-walk engines.
//!
//! Purpose
//! - One bounded walk loop (`run_walk`) driving three step strategies:
//!   `LatticeWalk` (nearest-neighbour walk on a grid), `WalkOnSpheres`
//!   (pure Dirichlet) and `WalkOnStars` (Dirichlet + reflecting Neumann).
//!
//! Loop
//! - Each iteration asks the strategy for the safe radius at the current
//!   state, stops if the state is absorbed or the step budget is spent, and
//!   otherwise lets the strategy move the walker.
//! - The outcome carries `g` at the exit point and the source integral
//!   gathered on the way; the walk's sample is `g(exit) - source`, which is
//!   the estimator for `∇²u = f`.

mod lattice;
mod spheres;
mod stars;

pub use lattice::LatticeWalk;
pub use spheres::{green_disk, WalkOnSpheres};
pub use stars::{hemisphere_angle, WalkOnStars};

use rand::Rng;

use crate::geom::Point2;

/// Mutable state of one walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkState<P> {
    pub position: P,
    /// Normal of the reflecting segment the walker rests on; `None` in the interior.
    pub normal: Option<Point2>,
    pub steps: u32,
    /// Source integral gathered so far.
    pub source_integral: f64,
}

impl<P> WalkState<P> {
    #[inline]
    pub fn start(position: P) -> Self {
        Self {
            position,
            normal: None,
            steps: 0,
            source_integral: 0.0,
        }
    }

    #[inline]
    pub fn on_boundary(&self) -> bool {
        self.normal.is_some()
    }
}

/// Safe region around the current position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRadius {
    /// Radius of the ball (or star) the next step may move within.
    pub radius: f64,
    /// Distance to the absorbing part of the boundary.
    pub absorbing_distance: f64,
}

/// How a walk ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Absorbed,
    MaxStepsExceeded,
}

/// Result of one walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkOutcome<P> {
    /// Position where the walk stopped.
    pub exit: P,
    /// `g` at the boundary point nearest to `exit`.
    pub boundary_value: f64,
    pub source_integral: f64,
    pub steps: u32,
    pub termination: Termination,
}

impl<P> WalkOutcome<P> {
    /// Monte Carlo sample of `u` at the start point.
    #[inline]
    pub fn value(&self) -> f64 {
        self.boundary_value - self.source_integral
    }
}

/// The capabilities a walk variant plugs into `run_walk`.
pub trait StepStrategy: Sync {
    type Position: Copy + Send;

    /// Safe region at the current state.
    fn next_radius(&self, state: &WalkState<Self::Position>) -> StepRadius;

    fn is_absorbed(&self, state: &WalkState<Self::Position>, radius: &StepRadius) -> bool;

    /// Move the walker (and accumulate any source contribution of this step).
    fn sample_next_point<R: Rng + ?Sized>(
        &self,
        state: &mut WalkState<Self::Position>,
        radius: &StepRadius,
        rng: &mut R,
    );

    /// `g` at the boundary point nearest to the current position.
    fn boundary_value(&self, state: &WalkState<Self::Position>) -> f64;
}

/// Walk from `start` until absorption or until `max_steps` steps were taken.
pub fn run_walk<S, R>(
    strategy: &S,
    start: S::Position,
    max_steps: u32,
    rng: &mut R,
) -> WalkOutcome<S::Position>
where
    S: StepStrategy + ?Sized,
    R: Rng + ?Sized,
{
    let mut state = WalkState::start(start);
    let termination = loop {
        let radius = strategy.next_radius(&state);
        if strategy.is_absorbed(&state, &radius) {
            break Termination::Absorbed;
        }
        if state.steps >= max_steps {
            break Termination::MaxStepsExceeded;
        }
        strategy.sample_next_point(&mut state, &radius, rng);
        state.steps += 1;
    };
    WalkOutcome {
        exit: state.position,
        boundary_value: strategy.boundary_value(&state),
        source_integral: state.source_integral,
        steps: state.steps,
        termination,
    }
}
