//! Monte Carlo random-walk solvers for `∇²u = f`, `u = g` on the boundary.
//!
//! Layers, leaves first:
//! - `geom`: polyline distance, silhouette, ray and winding queries.
//! - `boundary`: tagged Dirichlet/Neumann polylines and rectangles.
//! - `walk`: lattice walk, Walk-on-Spheres and Walk-on-Stars behind one
//!   `StepStrategy` trait and one bounded walk loop.
//! - `estimator`: N walks per point, mean/variance/divergence.
//! - `field`: lattice and raster evaluators, parallel over points.
//!
//! Sign convention: a walk scores `g(exit) - Σ source`, so a negative `f`
//! raises the solution (`∇²u = -4` in the unit disk gives `u = 1 - |x|²`).

pub mod boundary;
pub mod config;
pub mod error;
pub mod estimator;
pub mod field;
pub mod geom;
pub mod lattice;
pub mod problem;
pub mod seed;
pub mod walk;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use boundary::{Absorbing, Boundary, BoundaryKind, Rect};
pub use config::{DivergencePolicy, EstimatorConfig};
pub use error::SolveError;
pub use estimator::{estimate, Estimate};
pub use field::{
    rms_error, sample_analytic, solve_lattice, solve_spheres_on_grid, solve_spheres_on_raster,
    solve_stars_on_raster, Raster, RasterField,
};
pub use geom::{GeomCfg, Point2, Polyline};
pub use lattice::{Lattice, LatticeField};
pub use problem::{ScalarField, Zero};
pub use seed::ReplayToken;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::boundary::{Absorbing, Boundary, BoundaryKind, Rect};
    pub use crate::config::{DivergencePolicy, EstimatorConfig};
    pub use crate::estimator::{estimate, Estimate};
    pub use crate::field::{
        rms_error, sample_analytic, solve_lattice, solve_spheres_on_grid,
        solve_spheres_on_raster, solve_stars_on_raster, Raster, RasterField,
    };
    pub use crate::geom::{GeomCfg, Point2, Polyline};
    pub use crate::lattice::{Lattice, LatticeField};
    pub use crate::problem::{ScalarField, Zero};
    pub use crate::seed::ReplayToken;
    pub use crate::walk::{
        run_walk, LatticeWalk, StepStrategy, Termination, WalkOnSpheres, WalkOnStars,
    };
    pub use crate::SolveError;
}
