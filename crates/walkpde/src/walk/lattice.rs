//! Nearest-neighbour random walk on a lattice.

use nalgebra::SVector;
use rand::Rng;

use super::{StepRadius, StepStrategy, WalkState};
use crate::lattice::Lattice;
use crate::problem::ScalarField;

/// Lattice walk: each step moves to one of the `2D` axis neighbours with equal probability.
///
/// The walk is absorbed on any boundary node. At every interior node it
/// visits, `f` is accumulated with the discrete Green's weight of the
/// `2D + 1`-point Laplacian, `h² / 2D` with `h²` the geometric mean of the
/// squared spacings. For `D = 2` that is the cell area `h·k` over the four
/// directions.
pub struct LatticeWalk<'a, const D: usize, F, G> {
    lattice: &'a Lattice<D>,
    f: &'a F,
    g: &'a G,
    weight: f64,
}

impl<'a, const D: usize, F, G> LatticeWalk<'a, D, F, G>
where
    F: ScalarField<SVector<f64, D>>,
    G: ScalarField<SVector<f64, D>>,
{
    pub fn new(lattice: &'a Lattice<D>, f: &'a F, g: &'a G) -> Self {
        let cell_volume: f64 = (0..D).map(|k| lattice.spacing(k)).product();
        let weight = cell_volume.powf(2.0 / D as f64) / (2 * D) as f64;
        Self {
            lattice,
            f,
            g,
            weight,
        }
    }

    /// Source weight applied per visited interior node.
    #[inline]
    pub fn source_weight(&self) -> f64 {
        self.weight
    }
}

impl<'a, const D: usize, F, G> StepStrategy for LatticeWalk<'a, D, F, G>
where
    F: ScalarField<SVector<f64, D>>,
    G: ScalarField<SVector<f64, D>>,
{
    type Position = [usize; D];

    #[inline]
    fn next_radius(&self, state: &WalkState<[usize; D]>) -> StepRadius {
        let cells = self.lattice.cells_to_boundary(state.position) as f64;
        StepRadius {
            radius: 1.0,
            absorbing_distance: cells,
        }
    }

    #[inline]
    fn is_absorbed(&self, state: &WalkState<[usize; D]>, _radius: &StepRadius) -> bool {
        self.lattice.is_boundary(state.position)
    }

    fn sample_next_point<R: Rng + ?Sized>(
        &self,
        state: &mut WalkState<[usize; D]>,
        _radius: &StepRadius,
        rng: &mut R,
    ) {
        if !self.f.vanishes() {
            let x = self.lattice.point(state.position);
            state.source_integral += self.f.value(x) * self.weight;
        }
        let dir = rng.gen_range(0..2 * D);
        let axis = dir / 2;
        if dir % 2 == 0 {
            state.position[axis] += 1;
        } else {
            state.position[axis] -= 1;
        }
    }

    fn boundary_value(&self, state: &WalkState<[usize; D]>) -> f64 {
        let idx = self.lattice.snap_to_boundary(state.position);
        self.g.value(self.lattice.point(idx))
    }
}
