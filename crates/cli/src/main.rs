use anyhow::{bail, ensure, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::fmt::SubscriberBuilder;
use walkpde::prelude::*;

mod output;
mod problem;
mod provenance;

use output::Rows;
use problem::{build_boundary, build_raster, Constant, Method, Problem, SideData};

#[derive(Parser)]
#[command(name = "walkpde")]
#[command(about = "Random-walk solver runner for Laplace/Poisson problems")]
struct Cmd {
    /// Optional run label; propagated to outputs and logs
    #[arg(long)]
    label: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Evaluate a problem file on its grid or raster and write a CSV
    Field {
        #[arg(long)]
        problem: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Estimate the solution at one point and print it as JSON
    Point {
        #[arg(long)]
        problem: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },
    /// RMS difference of `u` between two field CSVs
    Compare {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        /// Fail if the RMS exceeds this
        #[arg(long)]
        max_rms: Option<f64>,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Field { problem, out } => field(&problem, &out, cmd.label),
        Action::Point { problem, x, y } => {
            let est = point(&Problem::load(&problem)?, Point2::new(x, y))?;
            println!("{}", serde_json::to_string_pretty(&est)?);
            Ok(())
        }
        Action::Compare { a, b, max_rms } => compare(&a, &b, max_rms),
        Action::Report => report(cmd.label),
    }
}

fn field(problem_path: &Path, out: &Path, label: Option<String>) -> Result<()> {
    let problem = Problem::load(problem_path)?;
    tracing::info!(
        method = problem.method_name(),
        problem = %problem_path.display(),
        out = %out.display(),
        label = ?label,
        "field"
    );
    let started = Instant::now();
    let (rows, diverged) = solve(&problem)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let points = rows.len();
    tracing::info!(points, diverged, elapsed_ms, "solved");
    rows.write_csv(out)?;

    let payload = provenance::Payload::new(serde_json::to_value(&problem)?)
        .with_label(label)
        .with_stats(serde_json::json!({
            "points": points,
            "diverged": diverged,
            "elapsed_ms": elapsed_ms,
        }));
    provenance::write_sidecar(out, payload)?;
    Ok(())
}

/// Field rows of a problem and the total number of divergent walks.
fn solve(problem: &Problem) -> Result<(Rows, u64)> {
    let cfg = &problem.estimator;
    let f = Constant(problem.source);
    let seed = problem.seed;
    match &problem.method {
        Method::Lattice {
            rect,
            divisions,
            sides,
        } => {
            let lattice = Lattice::over_rect(rect, divisions[0], divisions[1])?;
            let g = SideData {
                rect: *rect,
                sides: *sides,
            };
            let field = solve_lattice(&lattice, &f, &g, cfg, seed)?;
            Ok((Rows::from_lattice(&lattice, &field), field.total_diverged()))
        }
        Method::SpheresGrid {
            rect,
            divisions,
            sides,
        } => {
            let lattice = Lattice::over_rect(rect, divisions[0], divisions[1])?;
            let g = SideData {
                rect: *rect,
                sides: *sides,
            };
            let field = solve_spheres_on_grid(&lattice, &f, &g, cfg, seed)?;
            Ok((Rows::from_lattice(&lattice, &field), field.total_diverged()))
        }
        Method::Spheres { polylines, raster } => {
            let (boundary, g) = build_boundary(polylines, &problem.geom)?;
            let raster = build_raster(raster, &boundary)?;
            let field = solve_spheres_on_raster(&boundary, &f, &g, &raster, cfg, seed)?;
            Ok((Rows::from_raster(&raster, &field), field.total_diverged()))
        }
        Method::Stars { polylines, raster } => {
            ensure!(
                problem.source == 0.0,
                "walk on stars solves the Laplace case only; drop `source`"
            );
            let (boundary, g) = build_boundary(polylines, &problem.geom)?;
            let raster = build_raster(raster, &boundary)?;
            let field = solve_stars_on_raster(&boundary, &g, &raster, cfg, seed)?;
            Ok((Rows::from_raster(&raster, &field), field.total_diverged()))
        }
    }
}

/// Lattice node nearest to `x`.
fn nearest_node(lattice: &Lattice<2>, x: Point2) -> [usize; 2] {
    std::array::from_fn(|k| {
        let t = lattice.ticks(k);
        let steps = ((x[k] - t[0]) / lattice.spacing(k)).round();
        steps.clamp(0.0, (t.len() - 1) as f64) as usize
    })
}

fn point(problem: &Problem, x: Point2) -> Result<Estimate> {
    let cfg = &problem.estimator;
    let f = Constant(problem.source);
    let mut rng = ReplayToken::new(problem.seed, 0).to_std_rng();
    let est = match &problem.method {
        Method::Lattice {
            rect,
            divisions,
            sides,
        } => {
            let lattice = Lattice::over_rect(rect, divisions[0], divisions[1])?;
            let g = SideData {
                rect: *rect,
                sides: *sides,
            };
            let idx = nearest_node(&lattice, x);
            tracing::info!(?idx, node = ?lattice.point(idx), "snapped to lattice node");
            if lattice.is_boundary(idx) {
                Estimate::exact(g.value(lattice.point(idx)))
            } else {
                estimate(&LatticeWalk::new(&lattice, &f, &g), idx, cfg, &mut rng)?
            }
        }
        Method::SpheresGrid { rect, sides, .. } => {
            ensure!(rect.contains(x), "({}, {}) is outside the rectangle", x.x, x.y);
            let g = SideData {
                rect: *rect,
                sides: *sides,
            };
            estimate(&WalkOnSpheres::new(rect, &f, &g, cfg)?, x, cfg, &mut rng)?
        }
        Method::Spheres { polylines, .. } => {
            let (boundary, g) = build_boundary(polylines, &problem.geom)?;
            ensure!(boundary.contains(x), "({}, {}) is outside the domain", x.x, x.y);
            estimate(&WalkOnSpheres::new(&boundary, &f, &g, cfg)?, x, cfg, &mut rng)?
        }
        Method::Stars { polylines, .. } => {
            if problem.source != 0.0 {
                bail!("walk on stars solves the Laplace case only; drop `source`");
            }
            let (boundary, g) = build_boundary(polylines, &problem.geom)?;
            ensure!(boundary.contains(x), "({}, {}) is outside the domain", x.x, x.y);
            estimate(&WalkOnStars::new(&boundary, &g, cfg)?, x, cfg, &mut rng)?
        }
    };
    Ok(est)
}

fn compare(a: &Path, b: &Path, max_rms: Option<f64>) -> Result<()> {
    let (rms, cells) = output::compare_csv(a, b)?;
    tracing::info!(rms, cells, "compare");
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "rms": rms, "cells": cells }))?
    );
    if let Some(limit) = max_rms {
        ensure!(rms <= limit, "rms {rms} exceeds {limit}");
    }
    Ok(())
}

fn report(label: Option<String>) -> Result<()> {
    let obj = provenance::block(label.as_deref());
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use tempfile::tempdir;

    const BILINEAR: &str = r#"{
        "method": "lattice",
        "rect": {"a": 0, "b": 0.5, "c": 0, "d": 0.5},
        "divisions": [10, 10],
        "sides": {"top": {"a": 200}, "right": {"b": 200}},
        "estimator": {"walks": 4000},
        "seed": 7
    }"#;

    const CHANNEL: &str = r#"{
        "method": "stars",
        "polylines": [
            {"kind": "neumann", "points": [[0, 0], [1, 0]]},
            {"kind": "dirichlet", "points": [[1, 0], [1, 1]], "g": {"c": 1}},
            {"kind": "neumann", "points": [[1, 1], [0, 1]]},
            {"kind": "dirichlet", "points": [[0, 1], [0, 0]]}
        ],
        "raster": {"width": 4, "height": 2},
        "estimator": {"walks": 400, "epsilon": 0.001}
    }"#;

    fn write_problem(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("problem.json");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn field_writes_csv_and_sidecar() {
        let dir = tempdir().unwrap();
        let problem = write_problem(dir.path(), BILINEAR);
        let out = dir.path().join("out/u.csv");
        field(&problem, &out, Some("bilinear".into())).unwrap();
        assert!(dir.path().join("out/u.provenance.json").exists());
        let text = std::fs::read_to_string(&out).unwrap();
        let centre = text
            .lines()
            .find(|l| l.starts_with("5,5,"))
            .expect("row for node (5, 5)");
        let u: f64 = centre.split(',').nth(4).unwrap().parse().unwrap();
        assert!((u - 25.0).abs() < 2.0, "u(0.25, 0.25) = {u}");
    }

    #[test]
    fn point_snaps_to_lattice_and_is_reproducible() {
        let problem: Problem = serde_json::from_str(BILINEAR).unwrap();
        let a = point(&problem, vector![0.26, 0.24]).unwrap();
        let b = point(&problem, vector![0.25, 0.25]).unwrap();
        assert_eq!(a, b);
        let edge = point(&problem, vector![0.5, 0.2]).unwrap();
        assert_eq!(edge.walks, 0);
        assert!((edge.mean - 40.0).abs() < 1e-9);
    }

    #[test]
    fn stars_channel_field_and_compare() {
        let dir = tempdir().unwrap();
        let problem = write_problem(dir.path(), CHANNEL);
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        field(&problem, &a, None).unwrap();
        field(&problem, &b, None).unwrap();
        // Same seed, same field.
        compare(&a, &b, Some(0.0)).unwrap();
        let parsed: Problem = serde_json::from_str(CHANNEL).unwrap();
        let est = point(&parsed, vector![0.7, 0.5]).unwrap();
        assert!((est.mean - 0.7).abs() < 0.1, "{est:?}");
    }

    #[test]
    fn stars_rejects_source_and_outside_points() {
        let mut parsed: Problem = serde_json::from_str(CHANNEL).unwrap();
        assert!(point(&parsed, vector![1.5, 0.5]).is_err());
        parsed.source = 1.0;
        assert!(point(&parsed, vector![0.5, 0.5]).is_err());
        assert!(solve(&parsed).is_err());
    }
}
