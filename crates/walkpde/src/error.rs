//! Error type shared by the kernel, the walks and the field evaluators.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// The domain cannot be solved on (too coarse a grid, empty rectangle, wrong boundary kind).
    #[error("invalid domain: {reason}")]
    InvalidDomain { reason: String },
    /// Estimator parameters out of range.
    #[error("invalid estimator config: {reason}")]
    InvalidConfig { reason: String },
    /// Boundary pieces that the kernel cannot work with.
    #[error("degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },
    /// Every walk of one estimate hit the step budget and was discarded.
    #[error("all {walks} walks exceeded the step budget")]
    AllWalksDiverged { walks: u32 },
    /// A failure attributed to one evaluation point of a field.
    #[error("at grid index {index:?}: {source}")]
    AtPoint {
        index: Vec<usize>,
        #[source]
        source: Box<SolveError>,
    },
}

impl SolveError {
    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        Self::InvalidDomain {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            reason: reason.into(),
        }
    }

    pub(crate) fn at_point(self, index: &[usize]) -> Self {
        Self::AtPoint {
            index: index.to_vec(),
            source: Box::new(self),
        }
    }
}
