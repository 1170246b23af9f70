//! Tensor-product lattices and the fields sampled on them.
//!
//! - `Lattice<D>`: ordered ticks per axis over a box, at least
//!   `MIN_DIVISIONS` divisions per axis. Nodes with any index at 0 or at the
//!   last tick are boundary nodes.
//! - `LatticeField<D>`: one value per node, flattened row-major (the first
//!   axis varies slowest). For `D = 2`, `to_matrix()` yields a matrix whose
//!   entry `(i, j)` is the value at `(x_i, y_j)`.

use nalgebra::{DMatrix, SVector};

use crate::boundary::Rect;
use crate::error::SolveError;

/// Fewest divisions per axis that still leave interior nodes.
pub const MIN_DIVISIONS: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct Lattice<const D: usize> {
    ticks: [Vec<f64>; D],
}

impl<const D: usize> Lattice<D> {
    /// Uniform ticks `lo + k h` on every axis, with the last tick pinned to `hi`.
    pub fn new(lo: [f64; D], hi: [f64; D], divisions: [usize; D]) -> Result<Self, SolveError> {
        for k in 0..D {
            if divisions[k] < MIN_DIVISIONS {
                return Err(SolveError::domain(format!(
                    "axis {k} has {} divisions, need at least {MIN_DIVISIONS}",
                    divisions[k]
                )));
            }
            if !(lo[k].is_finite() && hi[k].is_finite()) || lo[k] >= hi[k] {
                return Err(SolveError::domain(format!(
                    "axis {k} extent [{}, {}] is empty or not finite",
                    lo[k], hi[k]
                )));
            }
        }
        let ticks = std::array::from_fn(|k| {
            let n = divisions[k];
            let h = (hi[k] - lo[k]) / n as f64;
            let mut t: Vec<f64> = (0..n).map(|i| lo[k] + h * i as f64).collect();
            t.push(hi[k]);
            t
        });
        Ok(Self { ticks })
    }

    #[inline]
    pub fn ticks(&self, axis: usize) -> &[f64] {
        &self.ticks[axis]
    }

    /// Node count per axis (divisions + 1).
    #[inline]
    pub fn dims(&self) -> [usize; D] {
        std::array::from_fn(|k| self.ticks[k].len())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ticks.iter().map(Vec::len).product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Uniform spacing along `axis`.
    #[inline]
    pub fn spacing(&self, axis: usize) -> f64 {
        let t = &self.ticks[axis];
        (t[t.len() - 1] - t[0]) / (t.len() - 1) as f64
    }

    #[inline]
    pub fn point(&self, idx: [usize; D]) -> SVector<f64, D> {
        SVector::from(std::array::from_fn(|k| self.ticks[k][idx[k]]))
    }

    #[inline]
    pub fn is_boundary(&self, idx: [usize; D]) -> bool {
        (0..D).any(|k| idx[k] == 0 || idx[k] + 1 == self.ticks[k].len())
    }

    /// Steps to the nearest boundary node along any single axis.
    #[inline]
    pub fn cells_to_boundary(&self, idx: [usize; D]) -> usize {
        (0..D)
            .map(|k| idx[k].min(self.ticks[k].len() - 1 - idx[k]))
            .min()
            .unwrap_or(0)
    }

    /// Nearest boundary node, moving along the axis with the fewest steps to go.
    pub fn snap_to_boundary(&self, mut idx: [usize; D]) -> [usize; D] {
        if self.is_boundary(idx) {
            return idx;
        }
        let mut best = (usize::MAX, 0, 0);
        for k in 0..D {
            let last = self.ticks[k].len() - 1;
            if idx[k] < best.0 {
                best = (idx[k], k, 0);
            }
            if last - idx[k] < best.0 {
                best = (last - idx[k], k, last);
            }
        }
        idx[best.1] = best.2;
        idx
    }

    #[inline]
    pub fn flat_index(&self, idx: [usize; D]) -> usize {
        (0..D).fold(0, |acc, k| acc * self.ticks[k].len() + idx[k])
    }

    #[inline]
    pub fn unflatten(&self, mut flat: usize) -> [usize; D] {
        let mut idx = [0; D];
        for k in (0..D).rev() {
            let n = self.ticks[k].len();
            idx[k] = flat % n;
            flat /= n;
        }
        idx
    }
}

impl Lattice<2> {
    /// `nx × ny` divisions over `rect`.
    pub fn over_rect(rect: &Rect, nx: usize, ny: usize) -> Result<Self, SolveError> {
        rect.validate()?;
        Self::new([rect.a, rect.c], [rect.b, rect.d], [nx, ny])
    }

    pub fn rect(&self) -> Rect {
        let (x, y) = (&self.ticks[0], &self.ticks[1]);
        Rect {
            a: x[0],
            b: x[x.len() - 1],
            c: y[0],
            d: y[y.len() - 1],
        }
    }
}

/// Values on the nodes of a lattice, with per-node Monte Carlo diagnostics.
///
/// Pinned boundary nodes and analytic samples carry zero standard error and
/// no divergent walks.
#[derive(Clone, Debug, PartialEq)]
pub struct LatticeField<const D: usize> {
    dims: [usize; D],
    values: Vec<f64>,
    std_error: Vec<f64>,
    diverged: Vec<u32>,
}

impl<const D: usize> LatticeField<D> {
    pub(crate) fn zeros(lattice: &Lattice<D>) -> Self {
        let n = lattice.len();
        Self {
            dims: lattice.dims(),
            values: vec![0.0; n],
            std_error: vec![0.0; n],
            diverged: vec![0; n],
        }
    }

    pub(crate) fn set(&mut self, flat: usize, value: f64, std_error: f64, diverged: u32) {
        self.values[flat] = value;
        self.std_error[flat] = std_error;
        self.diverged[flat] = diverged;
    }

    #[inline]
    pub fn dims(&self) -> [usize; D] {
        self.dims
    }

    #[inline]
    fn flat(&self, idx: [usize; D]) -> usize {
        (0..D).fold(0, |acc, k| acc * self.dims[k] + idx[k])
    }

    #[inline]
    pub fn get(&self, idx: [usize; D]) -> f64 {
        self.values[self.flat(idx)]
    }

    #[inline]
    pub fn std_error(&self, idx: [usize; D]) -> f64 {
        self.std_error[self.flat(idx)]
    }

    #[inline]
    pub fn diverged(&self, idx: [usize; D]) -> u32 {
        self.diverged[self.flat(idx)]
    }

    /// Flat values, row-major.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn total_diverged(&self) -> u64 {
        self.diverged.iter().map(|&d| u64::from(d)).sum()
    }
}

impl LatticeField<2> {
    /// Dense matrix with `(i, j)` ↔ `(x_i, y_j)`.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.dims[0], self.dims[1], &self.values)
    }
}
