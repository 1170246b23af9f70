//! Long-format CSV artifacts (`i, j, x, y, u, std_error, diverged`).

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use walkpde::{Lattice, LatticeField, Point2, Raster, RasterField};

/// One row per evaluated point.
#[derive(Default)]
pub struct Rows {
    i: Vec<u32>,
    j: Vec<u32>,
    x: Vec<f64>,
    y: Vec<f64>,
    u: Vec<f64>,
    std_error: Vec<f64>,
    diverged: Vec<u32>,
}

impl Rows {
    fn push(&mut self, i: usize, j: usize, p: Point2, u: f64, std_error: f64, diverged: u32) {
        self.i.push(i as u32);
        self.j.push(j as u32);
        self.x.push(p.x);
        self.y.push(p.y);
        self.u.push(u);
        self.std_error.push(std_error);
        self.diverged.push(diverged);
    }

    pub fn len(&self) -> usize {
        self.u.len()
    }

    /// Every node of a planar lattice.
    pub fn from_lattice(lattice: &Lattice<2>, field: &LatticeField<2>) -> Self {
        let mut rows = Self::default();
        let [nx, ny] = lattice.dims();
        for i in 0..nx {
            for j in 0..ny {
                rows.push(
                    i,
                    j,
                    lattice.point([i, j]),
                    field.get([i, j]),
                    field.std_error([i, j]),
                    field.diverged([i, j]),
                );
            }
        }
        rows
    }

    /// The raster cells inside the domain; outside cells are not written.
    pub fn from_raster(raster: &Raster, field: &RasterField) -> Self {
        let mut rows = Self::default();
        for i in 0..raster.width {
            for j in 0..raster.height {
                if field.inside[(i, j)] {
                    rows.push(
                        i,
                        j,
                        raster.point(i, j),
                        field.values[(i, j)],
                        field.std_error[(i, j)],
                        field.diverged[(i, j)],
                    );
                }
            }
        }
        rows
    }

    pub fn write_csv(self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let mut df = df!(
            "i" => self.i,
            "j" => self.j,
            "x" => self.x,
            "y" => self.y,
            "u" => self.u,
            "std_error" => self.std_error,
            "diverged" => self.diverged,
        )?;
        let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// RMS of `u` over the `(i, j)` cells present in both CSVs, and the number of such cells.
pub fn compare_csv(a: &Path, b: &Path) -> Result<(f64, usize)> {
    let read = |p: &Path| -> Result<LazyFrame> {
        Ok(LazyCsvReader::new(p)
            .with_infer_schema_length(Some(100))
            .finish()
            .with_context(|| format!("reading {}", p.display()))?
            .select([col("i"), col("j"), col("u").cast(DataType::Float64)]))
    };
    let keys = [col("i"), col("j")];
    let joined = read(a)?
        .join(read(b)?, keys.clone(), keys, JoinArgs::new(JoinType::Inner))
        .with_column((col("u") - col("u_right")).alias("d"))
        .select([
            (col("d") * col("d")).sum().alias("sq"),
            col("d").count().cast(DataType::Float64).alias("n"),
        ])
        .collect()?;
    let sq = joined.column("sq")?.f64()?.get(0).unwrap_or(0.0);
    let n = joined.column("n")?.f64()?.get(0).unwrap_or(0.0) as usize;
    if n == 0 {
        anyhow::bail!("no common (i, j) cells between {} and {}", a.display(), b.display());
    }
    Ok(((sq / n as f64).sqrt(), n))
}
