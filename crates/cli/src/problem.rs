//! Declarative problem files.
//!
//! A problem is one JSON object tagged by `method`:
//! - `lattice` / `spheres_grid`: a rectangle, its divisions, and one affine
//!   `g` per side (`left`, `right`, `bottom`, `top`).
//! - `spheres` / `stars`: tagged polylines, each Dirichlet polyline with its
//!   own affine `g`, sampled on a cell-centred raster.
//!
//! The source `f` is a constant (`source`, default 0). `estimator`, `geom`
//! and `seed` are optional.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use walkpde::geom::distance_to_polylines;
use walkpde::prelude::*;

/// `g(x, y) = a x + b y + c`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Affine {
    #[inline]
    pub fn at(&self, p: Point2) -> f64 {
        self.a * p.x + self.b * p.y + self.c
    }
}

/// Boundary data of a rectangle, one affine map per side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sides {
    pub left: Affine,
    pub right: Affine,
    pub bottom: Affine,
    pub top: Affine,
}

/// `g` on a rectangle: the map of the side nearest to the point (top and
/// bottom win at corners).
pub struct SideData {
    pub rect: Rect,
    pub sides: Sides,
}

impl ScalarField<Point2> for SideData {
    fn value(&self, p: Point2) -> f64 {
        let r = &self.rect;
        let s = &self.sides;
        [
            ((r.d - p.y).abs(), &s.top),
            ((p.y - r.c).abs(), &s.bottom),
            ((r.b - p.x).abs(), &s.right),
            ((p.x - r.a).abs(), &s.left),
        ]
        .into_iter()
        .min_by(|l, r| l.0.total_cmp(&r.0))
        .map_or(0.0, |(_, m)| m.at(p))
    }
}

/// `g` on tagged polylines: the map of the nearest Dirichlet polyline.
pub struct PolylineData {
    pub lines: Vec<(Polyline, Affine)>,
}

impl ScalarField<Point2> for PolylineData {
    fn value(&self, p: Point2) -> f64 {
        self.lines
            .iter()
            .map(|(line, g)| (distance_to_polylines(p, std::slice::from_ref(line)), g))
            .min_by(|l, r| l.0.total_cmp(&r.0))
            .map_or(0.0, |(_, g)| g.at(p))
    }
}

/// Constant source; zero is recognised as the Laplace case.
#[derive(Clone, Copy, Debug)]
pub struct Constant(pub f64);

impl<P> ScalarField<P> for Constant {
    #[inline]
    fn value(&self, _p: P) -> f64 {
        self.0
    }

    #[inline]
    fn vanishes(&self) -> bool {
        self.0 == 0.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolylineSpec {
    pub kind: BoundaryKind,
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub closed: bool,
    /// Only read for Dirichlet polylines.
    #[serde(default)]
    pub g: Affine,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterSpec {
    pub width: usize,
    pub height: usize,
    /// Defaults to the bounding box of the polylines.
    #[serde(default)]
    pub rect: Option<Rect>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Method {
    Lattice {
        rect: Rect,
        divisions: [usize; 2],
        #[serde(default)]
        sides: Sides,
    },
    SpheresGrid {
        rect: Rect,
        divisions: [usize; 2],
        #[serde(default)]
        sides: Sides,
    },
    Spheres {
        polylines: Vec<PolylineSpec>,
        raster: RasterSpec,
    },
    Stars {
        polylines: Vec<PolylineSpec>,
        raster: RasterSpec,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(flatten)]
    pub method: Method,
    #[serde(default)]
    pub source: f64,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub geom: GeomCfg,
    #[serde(default)]
    pub seed: u64,
}

impl Problem {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading problem {}", path.display()))?;
        let problem: Problem = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing problem {}", path.display()))?;
        problem
            .estimator
            .validate()
            .context("estimator section")?;
        problem.geom.validate().context("geom section")?;
        Ok(problem)
    }

    pub fn method_name(&self) -> &'static str {
        match self.method {
            Method::Lattice { .. } => "lattice",
            Method::SpheresGrid { .. } => "spheres_grid",
            Method::Spheres { .. } => "spheres",
            Method::Stars { .. } => "stars",
        }
    }
}

/// Boundary and per-polyline data of a polyline problem.
pub fn build_boundary(specs: &[PolylineSpec], geom: &GeomCfg) -> Result<(Boundary, PolylineData)> {
    let mut tagged = Vec::with_capacity(specs.len());
    let mut lines = Vec::new();
    for (k, spec) in specs.iter().enumerate() {
        let mut pts: Vec<Point2> = spec.points.iter().map(|&[x, y]| Point2::new(x, y)).collect();
        if spec.closed {
            if let Some(&first) = pts.first() {
                pts.push(first);
            }
        }
        let line = Polyline::with_cfg(pts, geom).with_context(|| format!("polyline {k}"))?;
        if spec.kind == BoundaryKind::Dirichlet {
            lines.push((line.clone(), spec.g));
        }
        tagged.push((spec.kind, line));
    }
    if lines.is_empty() {
        bail!("problem has no Dirichlet polylines");
    }
    let boundary = Boundary::from_tagged(tagged).with_geom(*geom)?;
    Ok((boundary, PolylineData { lines }))
}

/// Raster of a polyline problem, defaulting to the bounding box.
pub fn build_raster(spec: &RasterSpec, boundary: &Boundary) -> Result<Raster> {
    let rect = match spec.rect {
        Some(r) => r,
        None => boundary
            .bounding_rect()
            .context("polylines have no bounding box")?,
    };
    Ok(Raster::new(rect, spec.width, spec.height)?)
}
