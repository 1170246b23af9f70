//! Estimator configuration.

use serde::{Deserialize, Serialize};

use crate::error::SolveError;

/// What to do with a walk that runs out of steps before absorption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergencePolicy {
    /// Stop the walk and score the boundary value nearest to where it stands (bounded bias).
    #[default]
    Terminate,
    /// Drop the sample; the estimate averages the absorbed walks only.
    Discard,
}

/// Per-problem Monte Carlo parameters; read-only for a whole solve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Walks per evaluation point (N).
    pub walks: u32,
    /// Hard cap on the steps of a single walk (M).
    pub max_steps: u32,
    /// Distance to the absorbing boundary below which a walk stops (ε).
    pub epsilon: f64,
    /// Smallest star radius used by Walk-on-Stars (rMin).
    pub r_min: f64,
    pub divergence: DivergencePolicy,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            walks: 1024,
            max_steps: 65_536,
            epsilon: 1e-4,
            r_min: 1e-4,
            divergence: DivergencePolicy::Terminate,
        }
    }
}

impl EstimatorConfig {
    pub const fn new(walks: u32, max_steps: u32) -> Self {
        Self {
            walks,
            max_steps,
            epsilon: 1e-4,
            r_min: 1e-4,
            divergence: DivergencePolicy::Terminate,
        }
    }
    pub const fn with_epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }
    pub const fn with_r_min(self, r_min: f64) -> Self {
        Self { r_min, ..self }
    }
    pub const fn with_walks(self, walks: u32) -> Self {
        Self { walks, ..self }
    }
    pub const fn with_divergence(self, divergence: DivergencePolicy) -> Self {
        Self { divergence, ..self }
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        if self.walks == 0 {
            return Err(SolveError::config("walks must be > 0"));
        }
        if self.max_steps == 0 {
            return Err(SolveError::config("max_steps must be > 0"));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(SolveError::config("epsilon must be finite and > 0"));
        }
        if !(self.r_min.is_finite() && self.r_min > 0.0) {
            return Err(SolveError::config("r_min must be finite and > 0"));
        }
        Ok(())
    }
}
