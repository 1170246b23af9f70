//! Boundary descriptors.
//!
//! - `Boundary`: Dirichlet (absorbing) and Neumann (reflecting) polylines.
//! - `Rect`: axis-aligned rectangle, the absorbing boundary of the grid variants.
//! - `Absorbing`: what Walk-on-Spheres needs from a pure Dirichlet boundary.

use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::geom::{closest_point_on_polylines, GeomCfg, Point2, Polyline};

/// Boundary condition carried by a polyline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    /// Solution value prescribed by `g`.
    Dirichlet,
    /// Zero normal derivative (reflecting).
    Neumann,
}

/// Domain boundary as tagged polylines.
///
/// Invariants (caller's responsibility, not checked):
/// - Dirichlet ∪ Neumann form closed loops wound counter-clockwise.
#[derive(Clone, Debug, Default)]
pub struct Boundary {
    dirichlet: Vec<Polyline>,
    neumann: Vec<Polyline>,
    geom: GeomCfg,
}

impl Boundary {
    pub fn new(dirichlet: Vec<Polyline>, neumann: Vec<Polyline>) -> Self {
        Self {
            dirichlet,
            neumann,
            geom: GeomCfg::default(),
        }
    }

    /// Pure Dirichlet boundary.
    pub fn dirichlet_only(dirichlet: Vec<Polyline>) -> Self {
        Self::new(dirichlet, Vec::new())
    }

    pub fn from_tagged<I>(tagged: I) -> Self
    where
        I: IntoIterator<Item = (BoundaryKind, Polyline)>,
    {
        let mut out = Self::default();
        for (kind, line) in tagged {
            match kind {
                BoundaryKind::Dirichlet => out.dirichlet.push(line),
                BoundaryKind::Neumann => out.neumann.push(line),
            }
        }
        out
    }

    /// Replace the kernel tolerances; rejects non-positive or non-finite ones.
    pub fn with_geom(self, geom: GeomCfg) -> Result<Self, SolveError> {
        geom.validate()?;
        Ok(Self { geom, ..self })
    }

    #[inline]
    pub fn dirichlet(&self) -> &[Polyline] {
        &self.dirichlet
    }

    #[inline]
    pub fn neumann(&self) -> &[Polyline] {
        &self.neumann
    }

    #[inline]
    pub fn geom(&self) -> &GeomCfg {
        &self.geom
    }

    #[inline]
    pub fn is_pure_dirichlet(&self) -> bool {
        self.neumann.is_empty()
    }

    /// Domain containment via the winding-number rule.
    #[inline]
    pub fn contains(&self, x: Point2) -> bool {
        crate::geom::inside_domain(x, self)
    }

    /// Axis-aligned bounding box of all polylines, `None` when there are none.
    pub fn bounding_rect(&self) -> Option<Rect> {
        let mut pts = self
            .dirichlet
            .iter()
            .chain(self.neumann.iter())
            .flat_map(|p| p.points().iter().copied());
        let first = pts.next()?;
        let (lo, hi) = pts.fold((first, first), |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        });
        Rect::new(lo.x, hi.x, lo.y, hi.y).ok()
    }
}

/// Axis-aligned rectangle `[a, b] × [c, d]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Rect {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Result<Self, SolveError> {
        let r = Self { a, b, c, d };
        r.validate()?;
        Ok(r)
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        if ![self.a, self.b, self.c, self.d].iter().all(|v| v.is_finite()) {
            return Err(SolveError::domain("rectangle bounds must be finite"));
        }
        if self.a >= self.b || self.c >= self.d {
            return Err(SolveError::domain(format!(
                "rectangle [{}, {}] x [{}, {}] is empty",
                self.a, self.b, self.c, self.d
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.b - self.a
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.d - self.c
    }

    /// Closed containment.
    #[inline]
    pub fn contains(&self, x: Point2) -> bool {
        (self.a..=self.b).contains(&x.x) && (self.c..=self.d).contains(&x.y)
    }
}

/// A pure Dirichlet boundary that Walk-on-Spheres can query.
pub trait Absorbing: Sync {
    /// Distance from `x` to the boundary.
    fn distance(&self, x: Point2) -> f64;
    /// Closest boundary point to `x`; exit points are snapped here before `g` is evaluated.
    fn closest_point(&self, x: Point2) -> Point2;

    /// Reject boundaries a walk could never be absorbed on.
    fn check_absorbing(&self) -> Result<(), SolveError> {
        Ok(())
    }
}

impl Absorbing for Rect {
    /// Signed: negative outside the rectangle, which absorbs such points at once.
    #[inline]
    fn distance(&self, x: Point2) -> f64 {
        (x.x - self.a)
            .min(self.b - x.x)
            .min(x.y - self.c)
            .min(self.d - x.y)
    }

    fn closest_point(&self, x: Point2) -> Point2 {
        let p = Point2::new(x.x.clamp(self.a, self.b), x.y.clamp(self.c, self.d));
        let to_side = [
            (p.x - self.a, Point2::new(self.a, p.y)),
            (self.b - p.x, Point2::new(self.b, p.y)),
            (p.y - self.c, Point2::new(p.x, self.c)),
            (self.d - p.y, Point2::new(p.x, self.d)),
        ];
        to_side
            .into_iter()
            .min_by(|l, r| l.0.total_cmp(&r.0))
            .map_or(p, |(_, q)| q)
    }
}

impl Absorbing for Boundary {
    #[inline]
    fn distance(&self, x: Point2) -> f64 {
        crate::geom::distance_to_polylines(x, &self.dirichlet)
    }

    #[inline]
    fn closest_point(&self, x: Point2) -> Point2 {
        closest_point_on_polylines(x, &self.dirichlet).map_or(x, |(p, _)| p)
    }

    fn check_absorbing(&self) -> Result<(), SolveError> {
        if self.dirichlet.is_empty() {
            return Err(SolveError::domain("boundary has no Dirichlet polylines"));
        }
        if !self.neumann.is_empty() {
            return Err(SolveError::domain(
                "walk on spheres needs a pure Dirichlet boundary; use walk on stars",
            ));
        }
        Ok(())
    }
}
