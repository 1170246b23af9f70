//! Field evaluators: run the estimator at every point of a lattice or raster.
//!
//! Conventions
//! - Every point draws its walks from `ReplayToken::new(seed, flat)` with
//!   `flat` the row-major index of the point, so a field is reproducible
//!   for a given seed regardless of how rayon splits the work.
//! - Lattice solves pin boundary nodes to `g`; raster solves leave points
//!   outside the domain as NaN and mark them in `RasterField::inside`.
//! - Matrices follow `(i, j)` ↔ `(x_i, y_j)`.

use nalgebra::{DMatrix, SVector};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::boundary::{Boundary, Rect};
use crate::config::EstimatorConfig;
use crate::error::SolveError;
use crate::estimator::{estimate, Estimate};
use crate::geom::Point2;
use crate::lattice::{Lattice, LatticeField};
use crate::problem::ScalarField;
use crate::seed::ReplayToken;
use crate::walk::{LatticeWalk, WalkOnSpheres, WalkOnStars};

fn fill_lattice<const D: usize, P>(
    lattice: &Lattice<D>,
    per_point: P,
) -> Result<LatticeField<D>, SolveError>
where
    P: Fn(usize, [usize; D]) -> Result<Estimate, SolveError> + Sync,
{
    let estimates = (0..lattice.len())
        .into_par_iter()
        .map(|flat| {
            let idx = lattice.unflatten(flat);
            per_point(flat, idx).map_err(|e| e.at_point(&idx))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut field = LatticeField::zeros(lattice);
    for (flat, e) in estimates.into_iter().enumerate() {
        let std_error = if e.walks == 0 { 0.0 } else { e.std_error() };
        field.set(flat, e.mean, std_error, e.diverged);
    }
    Ok(field)
}

/// Lattice random walk on every interior node; boundary nodes are set to `g`.
pub fn solve_lattice<const D: usize, F, G>(
    lattice: &Lattice<D>,
    f: &F,
    g: &G,
    cfg: &EstimatorConfig,
    seed: u64,
) -> Result<LatticeField<D>, SolveError>
where
    F: ScalarField<SVector<f64, D>>,
    G: ScalarField<SVector<f64, D>>,
{
    cfg.validate()?;
    let walk = LatticeWalk::new(lattice, f, g);
    debug!(
        dims = ?lattice.dims(),
        walks = cfg.walks,
        weight = walk.source_weight(),
        "lattice solve"
    );
    let field = fill_lattice(lattice, |flat, idx| {
        if lattice.is_boundary(idx) {
            return Ok(Estimate::exact(g.value(lattice.point(idx))));
        }
        let mut rng = ReplayToken::new(seed, flat as u64).to_std_rng();
        estimate(&walk, idx, cfg, &mut rng)
    })?;
    log_done("lattice solve", field.total_diverged(), cfg);
    Ok(field)
}

/// Walk-on-Spheres from every interior node of a planar lattice, absorbing on its rectangle.
pub fn solve_spheres_on_grid<F, G>(
    lattice: &Lattice<2>,
    f: &F,
    g: &G,
    cfg: &EstimatorConfig,
    seed: u64,
) -> Result<LatticeField<2>, SolveError>
where
    F: ScalarField<Point2>,
    G: ScalarField<Point2>,
{
    let rect = lattice.rect();
    let wos = WalkOnSpheres::new(&rect, f, g, cfg)?;
    debug!(dims = ?lattice.dims(), walks = cfg.walks, "spheres grid solve");
    let field = fill_lattice(lattice, |flat, idx| {
        let x = lattice.point(idx);
        if lattice.is_boundary(idx) {
            return Ok(Estimate::exact(g.value(x)));
        }
        let mut rng = ReplayToken::new(seed, flat as u64).to_std_rng();
        estimate(&wos, x, cfg, &mut rng)
    })?;
    log_done("spheres grid solve", field.total_diverged(), cfg);
    Ok(field)
}

/// One summary line per solve; per-point divergence is only logged at debug level.
fn log_done(solve: &str, diverged: u64, cfg: &EstimatorConfig) {
    if diverged > 0 {
        warn!(
            solve,
            diverged,
            max_steps = cfg.max_steps,
            policy = ?cfg.divergence,
            "walks exceeded the step budget"
        );
    } else {
        debug!(solve, "done");
    }
}

/// Cell-centred `width × height` sampling of a rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Raster {
    pub rect: Rect,
    pub width: usize,
    pub height: usize,
}

impl Raster {
    pub fn new(rect: Rect, width: usize, height: usize) -> Result<Self, SolveError> {
        rect.validate()?;
        if width == 0 || height == 0 {
            return Err(SolveError::domain(format!(
                "raster {width} x {height} has no cells"
            )));
        }
        Ok(Self {
            rect,
            width,
            height,
        })
    }

    /// Centre of cell `(i, j)`: `(a + (i + ½) w / W, c + (j + ½) h / H)`.
    #[inline]
    pub fn point(&self, i: usize, j: usize) -> Point2 {
        let r = &self.rect;
        Point2::new(
            r.a + (i as f64 + 0.5) * r.width() / self.width as f64,
            r.c + (j as f64 + 0.5) * r.height() / self.height as f64,
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Estimates on a raster; cells outside the domain hold NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterField {
    pub values: DMatrix<f64>,
    pub inside: DMatrix<bool>,
    pub std_error: DMatrix<f64>,
    pub diverged: DMatrix<u32>,
}

impl RasterField {
    pub fn total_diverged(&self) -> u64 {
        self.diverged.iter().map(|&d| u64::from(d)).sum()
    }
}

fn fill_raster<P>(
    raster: &Raster,
    boundary: &Boundary,
    per_point: P,
) -> Result<RasterField, SolveError>
where
    P: Fn(usize, Point2) -> Result<Estimate, SolveError> + Sync,
{
    let (w, h) = (raster.width, raster.height);
    let estimates = (0..raster.len())
        .into_par_iter()
        .map(|flat| {
            let (i, j) = (flat / h, flat % h);
            let x = raster.point(i, j);
            if !boundary.contains(x) {
                return Ok(None);
            }
            per_point(flat, x)
                .map(Some)
                .map_err(|e| e.at_point(&[i, j]))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let at = |i: usize, j: usize| estimates[i * h + j].as_ref();
    let field = RasterField {
        values: DMatrix::from_fn(w, h, |i, j| at(i, j).map_or(f64::NAN, |e| e.mean)),
        inside: DMatrix::from_fn(w, h, |i, j| at(i, j).is_some()),
        std_error: DMatrix::from_fn(w, h, |i, j| at(i, j).map_or(f64::NAN, |e| e.std_error())),
        diverged: DMatrix::from_fn(w, h, |i, j| at(i, j).map_or(0, |e| e.diverged)),
    };
    Ok(field)
}

/// Walk-on-Spheres over a pure Dirichlet polyline boundary, at every raster cell inside it.
pub fn solve_spheres_on_raster<F, G>(
    boundary: &Boundary,
    f: &F,
    g: &G,
    raster: &Raster,
    cfg: &EstimatorConfig,
    seed: u64,
) -> Result<RasterField, SolveError>
where
    F: ScalarField<Point2>,
    G: ScalarField<Point2>,
{
    let wos = WalkOnSpheres::new(boundary, f, g, cfg)?;
    debug!(
        width = raster.width,
        height = raster.height,
        walks = cfg.walks,
        "spheres raster solve"
    );
    let field = fill_raster(raster, boundary, |flat, x| {
        let mut rng = ReplayToken::new(seed, flat as u64).to_std_rng();
        estimate(&wos, x, cfg, &mut rng)
    })?;
    log_done("spheres raster solve", field.total_diverged(), cfg);
    Ok(field)
}

/// Walk-on-Stars over a mixed boundary, at every raster cell inside it.
pub fn solve_stars_on_raster<G>(
    boundary: &Boundary,
    g: &G,
    raster: &Raster,
    cfg: &EstimatorConfig,
    seed: u64,
) -> Result<RasterField, SolveError>
where
    G: ScalarField<Point2>,
{
    let wost = WalkOnStars::new(boundary, g, cfg)?;
    debug!(
        width = raster.width,
        height = raster.height,
        walks = cfg.walks,
        "stars raster solve"
    );
    let field = fill_raster(raster, boundary, |flat, x| {
        let mut rng = ReplayToken::new(seed, flat as u64).to_std_rng();
        estimate(&wost, x, cfg, &mut rng)
    })?;
    log_done("stars raster solve", field.total_diverged(), cfg);
    Ok(field)
}

/// A closed-form solution sampled on every lattice node.
pub fn sample_analytic<const D: usize, U>(lattice: &Lattice<D>, u: &U) -> LatticeField<D>
where
    U: ScalarField<SVector<f64, D>>,
{
    let mut field = LatticeField::zeros(lattice);
    for flat in 0..lattice.len() {
        let x = lattice.point(lattice.unflatten(flat));
        field.set(flat, u.value(x), 0.0, 0);
    }
    field
}

/// Root-mean-square difference over the cells where both matrices are finite.
///
/// `None` if the shapes differ or no cell is comparable.
pub fn rms_error(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Option<f64> {
    if a.shape() != b.shape() {
        return None;
    }
    let (sum, n) = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .fold((0.0, 0usize), |(s, n), (x, y)| (s + (x - y).powi(2), n + 1));
    (n > 0).then(|| (sum / n as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DivergencePolicy;
    use crate::geom::Polyline;
    use crate::problem::Zero;
    use nalgebra::{dmatrix, vector, Vector2, Vector3};

    #[test]
    fn lattice_boundary_rows_equal_g() {
        let l = Lattice::over_rect(&Rect::new(0.0, 1.0, 0.0, 2.0).unwrap(), 5, 6).unwrap();
        let g = |p: Vector2<f64>| (3.0 * p.x).sin() + p.y * p.y;
        let cfg = EstimatorConfig::new(8, 10_000);
        let m = solve_lattice(&l, &Zero, &g, &cfg, 1).unwrap().to_matrix();
        let (nx, ny) = m.shape();
        for i in 0..nx {
            for j in [0, ny - 1] {
                assert_eq!(m[(i, j)], g(l.point([i, j])));
            }
        }
        for j in 0..ny {
            for i in [0, nx - 1] {
                assert_eq!(m[(i, j)], g(l.point([i, j])));
            }
        }
    }

    #[test]
    fn lattice_end_to_end_bilinear() {
        // u = 400xy on [0, 0.5]²: 0 on the axes, 200x on y = 0.5, 200y on x = 0.5.
        let l = Lattice::over_rect(&Rect::new(0.0, 0.5, 0.0, 0.5).unwrap(), 10, 10).unwrap();
        let g = |p: Vector2<f64>| {
            if p.y == 0.5 {
                200.0 * p.x
            } else if p.x == 0.5 {
                200.0 * p.y
            } else {
                0.0
            }
        };
        let cfg = EstimatorConfig::new(20_000, 100_000);
        let field = solve_lattice(&l, &Zero, &g, &cfg, 2024).unwrap();
        assert_eq!(l.point([5, 5]), vector![0.25, 0.25]);
        let u = field.get([5, 5]);
        assert!((u - 25.0).abs() < 1.0, "u(0.25, 0.25) = {u}");
        assert_eq!(field.total_diverged(), 0);
        assert!(field.std_error([5, 5]) > 0.0);
        assert_eq!(field.std_error([0, 5]), 0.0);
    }

    #[test]
    fn same_seed_reproduces_field() {
        let l = Lattice::over_rect(&Rect::new(0.0, 1.0, 0.0, 1.0).unwrap(), 6, 6).unwrap();
        let g = |p: Vector2<f64>| p.x - p.y;
        let cfg = EstimatorConfig::new(32, 10_000);
        let a = solve_lattice(&l, &Zero, &g, &cfg, 5).unwrap();
        let b = solve_lattice(&l, &Zero, &g, &cfg, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn spheres_error_shrinks_with_walks() {
        // u = x e^y is harmonic.
        let u = |p: Vector2<f64>| p.x * p.y.exp();
        let l = Lattice::over_rect(&Rect::new(0.0, 2.0, 0.0, 1.0).unwrap(), 8, 4).unwrap();
        let exact = sample_analytic(&l, &u).to_matrix();
        // Pooled over seeds so the ratio is close to the √100 = 10 of the walk count.
        let rms = |walks: u32| {
            let cfg = EstimatorConfig::new(walks, 10_000).with_epsilon(1e-4);
            let seeds = [77, 78, 79, 80];
            let sq: f64 = seeds
                .iter()
                .map(|&seed| {
                    let m = solve_spheres_on_grid(&l, &Zero, &u, &cfg, seed).unwrap().to_matrix();
                    rms_error(&m, &exact).unwrap().powi(2)
                })
                .sum();
            (sq / seeds.len() as f64).sqrt()
        };
        let coarse = rms(16);
        let fine = rms(1600);
        assert!(fine * 5.0 < coarse, "rms {coarse} -> {fine}");
        assert!(fine * 20.0 > coarse, "rms {coarse} -> {fine}");
    }

    #[test]
    fn terminated_walks_are_counted_per_node_and_in_total() {
        let l = Lattice::over_rect(&Rect::new(0.0, 1.0, 0.0, 1.0).unwrap(), 100, 100).unwrap();
        let g = |_p: Vector2<f64>| 0.0;
        let cfg = EstimatorConfig::new(4, 1);
        let field = solve_lattice(&l, &Zero, &g, &cfg, 3).unwrap();
        // One step never reaches the boundary from two nodes away.
        assert_eq!(field.diverged([50, 50]), 4);
        assert_eq!(field.diverged([0, 50]), 0);
        let total = field.total_diverged();
        assert!((4 * 97 * 97..=4 * 99 * 99).contains(&total), "{total}");
    }

    #[test]
    fn discarded_walks_are_attributed_to_their_node() {
        let l = Lattice::over_rect(&Rect::new(0.0, 1.0, 0.0, 1.0).unwrap(), 100, 100).unwrap();
        let g = |_p: Vector2<f64>| 0.0;
        let cfg = EstimatorConfig::new(4, 1).with_divergence(DivergencePolicy::Discard);
        let err = solve_lattice(&l, &Zero, &g, &cfg, 3).unwrap_err();
        match err {
            SolveError::AtPoint { index, source } => {
                assert_eq!(index.len(), 2);
                assert_eq!(*source, SolveError::AllWalksDiverged { walks: 4 });
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn three_d_linear_data_is_reproduced() {
        let l = Lattice::new([0.0; 3], [1.0; 3], [6, 6, 6]).unwrap();
        let g = |p: Vector3<f64>| p.x + p.y + p.z;
        let cfg = EstimatorConfig::new(2_000, 100_000);
        let field = solve_lattice(&l, &Zero, &g, &cfg, 11).unwrap();
        assert_eq!(field.dims(), [7, 7, 7]);
        assert_eq!(field.get([0, 3, 3]), g(l.point([0, 3, 3])));
        let u = field.get([3, 3, 3]);
        assert!((u - 1.5).abs() < 0.1, "u(centre) = {u}");
    }

    #[test]
    fn raster_cells_outside_are_nan() {
        // Right triangle (0,0), (1,0), (0,1) on the unit-square raster.
        let tri =
            Polyline::closed(vec![vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 1.0]])
                .unwrap();
        let b = Boundary::dirichlet_only(vec![tri]);
        let raster = Raster::new(b.bounding_rect().unwrap(), 4, 4).unwrap();
        let g = |p: Point2| p.x + 2.0 * p.y;
        let cfg = EstimatorConfig::new(64, 10_000);
        let field = solve_spheres_on_raster(&b, &Zero, &g, &raster, &cfg, 1).unwrap();
        assert_eq!(field.values.shape(), (4, 4));
        // (0.875, 0.875) is outside, (0.125, 0.125) inside.
        assert!(!field.inside[(3, 3)]);
        assert!(field.values[(3, 3)].is_nan());
        assert!(field.inside[(0, 0)]);
        // g is linear, so every walk scores it exactly up to ε.
        let x = raster.point(0, 0);
        assert!((field.values[(0, 0)] - g(x)).abs() < 1e-2);
    }

    #[test]
    fn stars_raster_on_reflecting_channel() {
        let p = |x: f64, y: f64| vector![x, y];
        let b = Boundary::new(
            vec![
                Polyline::new(vec![p(1.0, 0.0), p(1.0, 1.0)]).unwrap(),
                Polyline::new(vec![p(0.0, 1.0), p(0.0, 0.0)]).unwrap(),
            ],
            vec![
                Polyline::new(vec![p(0.0, 0.0), p(1.0, 0.0)]).unwrap(),
                Polyline::new(vec![p(1.0, 1.0), p(0.0, 1.0)]).unwrap(),
            ],
        );
        let raster = Raster::new(Rect::new(0.0, 1.0, 0.0, 1.0).unwrap(), 4, 2).unwrap();
        let g = |q: Point2| q.x;
        let cfg = EstimatorConfig::new(400, 100_000).with_epsilon(1e-3);
        let field = solve_stars_on_raster(&b, &g, &raster, &cfg, 12).unwrap();
        assert!(field.inside.iter().all(|&v| v));
        for i in 0..4 {
            for j in 0..2 {
                let want = raster.point(i, j).x;
                let got = field.values[(i, j)];
                assert!((got - want).abs() < 0.12, "({i}, {j}): {got} vs {want}");
            }
        }
    }

    #[test]
    fn rms_ignores_nan_and_checks_shape() {
        let a = dmatrix![1.0, f64::NAN; 3.0, 4.0];
        let b = dmatrix![2.0, 5.0; 3.0, 4.0];
        let r = rms_error(&a, &b).unwrap();
        assert!((r - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(rms_error(&a, &DMatrix::zeros(3, 2)).is_none());
        let all_nan = DMatrix::from_element(2, 2, f64::NAN);
        assert!(rms_error(&all_nan, &b).is_none());
    }

    #[test]
    fn raster_centres_cells() {
        let r = Raster::new(Rect::new(0.0, 2.0, 1.0, 2.0).unwrap(), 4, 2).unwrap();
        assert_eq!(r.point(0, 0), vector![0.25, 1.25]);
        assert_eq!(r.point(3, 1), vector![1.75, 1.75]);
        assert!(Raster::new(Rect::new(0.0, 1.0, 0.0, 1.0).unwrap(), 0, 3).is_err());
    }
}
