//! Monte Carlo aggregation of walks at one evaluation point.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DivergencePolicy, EstimatorConfig};
use crate::error::SolveError;
use crate::walk::{run_walk, StepStrategy, Termination};

/// Online mean/variance accumulator (Welford).
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    n: u32,
    mean: f64,
    m2: f64,
}

impl Stats {
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.n = self.n.saturating_add(1);
        let delta = x - self.mean;
        self.mean += delta / f64::from(self.n);
        self.m2 += delta * (x - self.mean);
    }
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }
    /// Unbiased sample variance; 0 if fewer than two samples.
    #[inline]
    pub fn var(&self) -> f64 {
        if self.n > 1 {
            self.m2 / f64::from(self.n - 1)
        } else {
            0.0
        }
    }
    #[inline]
    pub fn count(&self) -> u32 {
        self.n
    }
}

/// Estimate of `u` at one point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub mean: f64,
    /// Sample variance of the accepted walks.
    pub variance: f64,
    /// Walks that entered the mean.
    pub walks: u32,
    /// Walks that ran out of steps (scored or discarded per the policy).
    pub diverged: u32,
    pub mean_steps: f64,
}

impl Estimate {
    /// Standard error of the mean, `sqrt(variance / walks)`.
    #[inline]
    pub fn std_error(&self) -> f64 {
        if self.walks == 0 {
            return f64::INFINITY;
        }
        (self.variance / f64::from(self.walks)).sqrt()
    }

    /// An exactly known value (pinned boundary node).
    pub fn exact(value: f64) -> Self {
        Self {
            mean: value,
            variance: 0.0,
            walks: 0,
            diverged: 0,
            mean_steps: 0.0,
        }
    }
}

/// Run `cfg.walks` independent walks from `start` and average their samples.
///
/// Walks run sequentially on `rng`, so the result depends only on the
/// generator's state.
pub fn estimate<S, R>(
    strategy: &S,
    start: S::Position,
    cfg: &EstimatorConfig,
    rng: &mut R,
) -> Result<Estimate, SolveError>
where
    S: StepStrategy + ?Sized,
    R: Rng + ?Sized,
{
    cfg.validate()?;
    let mut stats = Stats::default();
    let mut diverged = 0u32;
    let mut steps = 0u64;
    for _ in 0..cfg.walks {
        let out = run_walk(strategy, start, cfg.max_steps, rng);
        steps += u64::from(out.steps);
        if out.termination == Termination::MaxStepsExceeded {
            diverged += 1;
            if cfg.divergence == DivergencePolicy::Discard {
                continue;
            }
        }
        stats.push(out.value());
    }
    if diverged > 0 {
        debug!(
            diverged,
            walks = cfg.walks,
            max_steps = cfg.max_steps,
            policy = ?cfg.divergence,
            "walks exceeded the step budget"
        );
    }
    if stats.count() == 0 {
        return Err(SolveError::AllWalksDiverged { walks: cfg.walks });
    }
    Ok(Estimate {
        mean: stats.mean(),
        variance: stats.var(),
        walks: stats.count(),
        diverged,
        mean_steps: steps as f64 / f64::from(cfg.walks),
    })
}
