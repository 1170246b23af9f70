use super::*;
use crate::boundary::Boundary;
use nalgebra::vector;
use proptest::prelude::*;

fn unit_square() -> Polyline {
    Polyline::closed(vec![
        vector![0.0, 0.0],
        vector![1.0, 0.0],
        vector![1.0, 1.0],
        vector![0.0, 1.0],
    ])
    .unwrap()
}

#[test]
fn geom_cfg_rejects_bad_tolerances() {
    let base = GeomCfg::default();
    assert!(base.validate().is_ok());
    assert!(base.with_winding_tol(-1.0).validate().is_err());
    assert!(base.with_winding_tol(0.0).validate().is_err());
    assert!(base.with_ray_offset(-1e-5).validate().is_err());
    assert!(base.with_eps_det(f64::NAN).validate().is_err());
    assert!(matches!(
        base.with_min_segment_len(f64::INFINITY).validate(),
        Err(crate::error::SolveError::InvalidConfig { .. })
    ));
    let pts = vec![vector![0.0, 0.0], vector![1.0, 0.0]];
    assert!(Polyline::with_cfg(pts, &base.with_min_segment_len(-1.0)).is_err());
}

#[test]
fn projection_hits_foot_or_nearest_endpoint() {
    let a = vector![0.0, 0.0];
    let b = vector![2.0, 0.0];
    // Foot inside the segment
    assert_eq!(project_onto_segment(vector![0.5, 3.0], a, b), vector![0.5, 0.0]);
    // Acute: foot beyond b snaps to b
    assert_eq!(project_onto_segment(vector![3.0, 1.0], a, b), b);
    // Behind a
    assert_eq!(project_onto_segment(vector![-1.0, -1.0], a, b), a);
    // Right angle at a: the foot is the endpoint itself
    assert_eq!(project_onto_segment(vector![0.0, 3.0], a, b), a);
    assert_eq!(project_onto_segment(vector![2.0, -1.5], a, b), b);
    // Zero-length segment
    assert_eq!(project_onto_segment(vector![5.0, 5.0], a, a), a);
}

#[test]
fn polyline_validation() {
    assert!(matches!(
        Polyline::new(vec![vector![0.0, 0.0]]),
        Err(crate::SolveError::DegenerateGeometry { .. })
    ));
    assert!(Polyline::new(vec![vector![0.0, 0.0], vector![0.0, 0.0]]).is_err());
    assert!(Polyline::new(vec![vector![0.0, 0.0], vector![f64::NAN, 1.0]]).is_err());
    let sq = unit_square();
    assert!(sq.is_closed());
    assert_eq!(sq.segments().count(), 4);
    assert_eq!(sq.corners().count(), 4);
    let open =
        Polyline::new(vec![vector![0.0, 0.0], vector![1.0, 0.0], vector![1.0, 1.0]]).unwrap();
    assert!(!open.is_closed());
    assert_eq!(open.corners().count(), 1);
}

#[test]
fn distance_to_square_and_empty_set() {
    let sq = [unit_square()];
    assert!((distance_to_polylines(vector![0.5, 0.25], &sq) - 0.25).abs() < 1e-12);
    assert!((distance_to_polylines(vector![2.0, 2.0], &sq) - 2f64.sqrt()).abs() < 1e-12);
    let (p, _) = closest_point_on_polylines(vector![0.9, 0.5], &sq).unwrap();
    assert_eq!(p, vector![1.0, 0.5]);
    assert_eq!(distance_to_polylines(vector![0.0, 0.0], &[]), f64::INFINITY);
    assert!(closest_point_on_polylines(vector![0.0, 0.0], &[]).is_none());
}

#[test]
fn silhouette_classification() {
    let a = vector![0.0, 0.0];
    let b = vector![1.0, 0.0];
    let c = vector![1.0, 1.0];
    // Below the first edge, left of the second: visible from one side only.
    assert!(is_silhouette(a, b, c, vector![0.5, -0.5]));
    // Inside the convex corner, in front of both edges.
    assert!(!is_silhouette(a, b, c, vector![0.5, 0.5]));
    // Behind both edges.
    assert!(!is_silhouette(a, b, c, vector![2.0, -1.0]));
    // Collinear chain never qualifies.
    assert!(!is_silhouette(a, b, vector![2.0, 0.0], vector![0.3, 0.7]));
}

#[test]
fn silhouette_distance_of_convex_loop_from_inside_is_infinite() {
    let sq = [unit_square()];
    assert_eq!(silhouette_distance(vector![0.5, 0.5], &sq), f64::INFINITY);
    // From outside, two vertices of the square are silhouettes; the nearest
    // one to (2, 0.5) is at distance sqrt(1.25).
    let d = silhouette_distance(vector![2.0, 0.5], &sq);
    assert!((d - 1.25f64.sqrt()).abs() < 1e-12, "{d}");
}

#[test]
fn closing_vertex_counts_as_corner() {
    // Seen from (0.2, -1) the closing vertex (0,0) and the vertex (1,0) are
    // silhouettes; (0,0) is the nearer one.
    let tri = [
        Polyline::closed(vec![vector![0.0, 0.0], vector![1.0, 0.0], vector![0.0, 1.0]]).unwrap(),
    ];
    let x = vector![0.2, -1.0];
    let d = silhouette_distance(x, &tri);
    assert!((d - 1.04f64.sqrt()).abs() < 1e-12, "{d}");
}

#[test]
fn ray_hits_and_misses() {
    let a = vector![0.0, 0.0];
    let b = vector![0.0, 2.0];
    let t = ray_intersect(vector![-1.0, 1.0], vector![1.0, 0.0], a, b, 1e-12);
    assert!((t - 1.0).abs() < 1e-12);
    // Pointing away
    assert_eq!(ray_intersect(vector![-1.0, 1.0], vector![-1.0, 0.0], a, b, 1e-12), f64::INFINITY);
    // Parallel
    assert_eq!(ray_intersect(vector![-1.0, 1.0], vector![0.0, 1.0], a, b, 1e-12), f64::INFINITY);
    // Passes beyond the segment's end
    assert_eq!(ray_intersect(vector![-1.0, 3.0], vector![1.0, 0.0], a, b, 1e-12), f64::INFINITY);
}

#[test]
fn first_hit_clips_to_radius_and_reports_normal() {
    let cfg = GeomCfg::default();
    let floor = [Polyline::new(vec![vector![0.0, 0.0], vector![1.0, 0.0]]).unwrap()];
    let down = vector![0.0, -1.0];
    let hit = first_hit(vector![0.5, 0.5], down, 1.0, &floor, &cfg);
    assert!(hit.on_boundary());
    assert!((hit.point.y).abs() < 1e-4);
    let n = hit.normal.unwrap();
    assert!((n - vector![0.0, 1.0]).norm() < 1e-12);
    // Radius shorter than the distance to the floor: stop on the circle.
    let miss = first_hit(vector![0.5, 0.5], down, 0.2, &floor, &cfg);
    assert!(!miss.on_boundary());
    assert!((miss.point - vector![0.5, 0.3]).norm() < 1e-12);
    // Resting on the floor, moving up: the floor itself is not re-hit.
    let up = first_hit(vector![0.5, 0.0], vector![0.0, 1.0], 0.4, &floor, &cfg);
    assert!(up.normal.is_none());
}

#[test]
fn winding_containment() {
    let b = Boundary::dirichlet_only(vec![unit_square()]);
    assert!(inside_domain(vector![0.5, 0.5], &b));
    assert!(inside_domain(vector![0.99, 0.01], &b));
    assert!(!inside_domain(vector![1.5, 0.5], &b));
    assert!(!inside_domain(vector![-100.0, 40.0], &b));
    assert!((signed_angle(vector![0.2, 0.7], b.dirichlet()) - std::f64::consts::TAU).abs() < 1e-9);
}

#[test]
fn containment_sums_both_kinds() {
    let p = |x: f64, y: f64| vector![x, y];
    let b = Boundary::new(
        vec![Polyline::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]).unwrap()],
        vec![Polyline::new(vec![p(1.0, 1.0), p(0.0, 1.0), p(0.0, 0.0)]).unwrap()],
    );
    assert!(b.contains(p(0.3, 0.6)));
    assert!(!b.contains(p(1.3, 0.6)));
}

proptest! {
    #[test]
    fn projection_lies_on_segment_and_is_nearest(
        ax in -10.0..10.0f64, ay in -10.0..10.0f64,
        bx in -10.0..10.0f64, by in -10.0..10.0f64,
        xx in -10.0..10.0f64, xy in -10.0..10.0f64,
    ) {
        let (a, b, x) = (vector![ax, ay], vector![bx, by], vector![xx, xy]);
        prop_assume!((b - a).norm() > 1e-6);
        let p = project_onto_segment(x, a, b);
        // On the segment: collinear and between the endpoints.
        let len = (b - a).norm();
        prop_assert!(cross(b - a, p - a).abs() <= 1e-9 * len.max(1.0) * 20.0);
        prop_assert!(((p - a).norm() + (b - p).norm() - len).abs() <= 1e-9 * 20.0);
        // No farther than either endpoint.
        let d = (x - p).norm();
        prop_assert!(d <= (x - a).norm() + 1e-9);
        prop_assert!(d <= (x - b).norm() + 1e-9);
    }

    #[test]
    fn rot90_is_a_quarter_turn(x in -5.0..5.0f64, y in -5.0..5.0f64) {
        let v = vector![x, y];
        let r = rot90(v);
        prop_assert!(r.dot(&v).abs() < 1e-12);
        prop_assert!(cross(v, r) >= 0.0);
        prop_assert!((r.norm() - v.norm()).abs() < 1e-12);
    }
}
