use approx::{assert_abs_diff_eq, assert_relative_eq};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bestfit::data::{SampleSpec, generate_sample};
use bestfit::domain::{FitKind, Point, PointCloud, Primitive, RigidTransform, Vector, WeightMode};
use bestfit::error::FitError;
use bestfit::fit::BestFitSolver;
use bestfit::io::{load_points, write_points_csv};
use bestfit::math::BackendKind;
use bestfit::{fit_line, fit_plane};

fn solvers() -> Vec<BestFitSolver> {
    let mut out = vec![BestFitSolver::with_backend(BackendKind::Jacobi).unwrap()];
    if bestfit::math::is_available(BackendKind::Native) {
        out.push(BestFitSolver::with_backend(BackendKind::Native).unwrap());
    }
    out
}

/// Anisotropic cloud (spreads 5, 2, 0.3 along x, y, z) so no eigenvalues tie.
fn blob(rng: &mut StdRng, n: usize) -> Vec<Point> {
    (0..n)
        .map(|_| {
            Point::new(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-0.3..0.3),
            )
        })
        .collect()
}

fn parallel(a: Vector, b: Vector) -> f64 {
    a.dot(b).abs()
}

#[test]
fn unit_square_plane() {
    let cloud = PointCloud::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]);
    for solver in solvers() {
        let fit = solver.fit_plane(&cloud).unwrap();
        let plane = fit.plane().unwrap();
        assert_eq!(plane.origin, Point::new(0.5, 0.5, 0.0));
        assert_abs_diff_eq!(plane.normal.z, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.residual, 0.0, epsilon = 1e-12);
        assert_eq!(fit.backend, solver.backend_kind());
    }
}

#[test]
fn diagonal_line() {
    let cloud = PointCloud::from_coords(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
    for solver in solvers() {
        let fit = solver.fit_line(&cloud).unwrap();
        let line = fit.line().unwrap();
        let expected = 1.0 / 3f64.sqrt();
        assert_relative_eq!(line.origin.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(line.origin.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(line.origin.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(line.direction.x, expected, epsilon = 1e-9);
        assert_relative_eq!(line.direction.y, expected, epsilon = 1e-9);
        assert_relative_eq!(line.direction.z, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.residual, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn two_points_give_their_line() {
    let a = Point::new(1.0, -2.0, 0.5);
    let b = Point::new(4.0, 2.0, 0.5);
    let fit = fit_line(&PointCloud::new(vec![a, b])).unwrap();
    let line = fit.line().unwrap();
    let d = (b - a).normalize().unwrap();
    assert_relative_eq!(parallel(line.direction, d), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.residual, 0.0, epsilon = 1e-12);
}

#[test]
fn too_few_points_are_degenerate() {
    let two = PointCloud::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
    let one = PointCloud::from_coords(&[[0.0, 0.0, 0.0]]);
    assert!(matches!(fit_plane(&two), Err(FitError::DegenerateInput { .. })));
    assert!(matches!(fit_line(&one), Err(FitError::DegenerateInput { .. })));
    assert!(matches!(fit_line(&PointCloud::new(Vec::new())), Err(FitError::DegenerateInput { .. })));
}

#[test]
fn coplanar_points_have_zero_residual_and_orthogonal_normal() {
    let mut rng = StdRng::seed_from_u64(11);
    let u = Vector::new(1.0, 2.0, -0.5).normalize().unwrap();
    let v = u.cross(Vector::new(0.3, -1.0, 2.0)).normalize().unwrap();
    let origin = Point::new(3.0, -1.0, 7.0);
    let points: Vec<Point> = (0..40)
        .map(|_| origin + u * rng.gen_range(-4.0..4.0) + v * rng.gen_range(-4.0..4.0))
        .collect();

    for solver in solvers() {
        let fit = solver.fit_plane(&PointCloud::new(points.clone())).unwrap();
        let n = fit.plane().unwrap().normal;
        assert_abs_diff_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert!(fit.residual < 1e-9, "residual {}", fit.residual);
        for w in points.windows(2) {
            assert_abs_diff_eq!(n.dot(w[1] - w[0]), 0.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn plane_and_line_are_rigid_transform_invariant() {
    let mut rng = StdRng::seed_from_u64(5);
    let points = blob(&mut rng, 60);
    let transform = RigidTransform::from_axis_angle(Vector::new(0.2, -1.0, 0.7), 1.1, Vector::new(10.0, -4.0, 2.5));
    let moved: Vec<Point> = points.iter().map(|&p| transform.apply_point(p)).collect();

    for solver in solvers() {
        let before = solver.fit_plane(&PointCloud::new(points.clone())).unwrap();
        let after = solver.fit_plane(&PointCloud::new(moved.clone())).unwrap();
        let (p0, p1) = (before.plane().unwrap(), after.plane().unwrap());
        assert_abs_diff_eq!(transform.apply_point(p0.origin).distance(p1.origin), 0.0, epsilon = 1e-9);
        assert_relative_eq!(parallel(transform.apply_vector(p0.normal), p1.normal), 1.0, epsilon = 1e-9);
        assert_relative_eq!(before.residual, after.residual, max_relative = 1e-9);

        let before = solver.fit_line(&PointCloud::new(points.clone())).unwrap();
        let after = solver.fit_line(&PointCloud::new(moved.clone())).unwrap();
        let (l0, l1) = (before.line().unwrap(), after.line().unwrap());
        assert_abs_diff_eq!(transform.apply_point(l0.origin).distance(l1.origin), 0.0, epsilon = 1e-9);
        assert_relative_eq!(parallel(transform.apply_vector(l0.direction), l1.direction), 1.0, epsilon = 1e-9);
        assert_relative_eq!(before.residual, after.residual, max_relative = 1e-9);
    }
}

/// Exactly coplanar strip: long along `u`, `width` across along `v`.
fn strip(rng: &mut StdRng, u: Vector, v: Vector, width: f64) -> Vec<Point> {
    let origin = Point::new(2.0, -3.0, 1.5);
    (0..60)
        .map(|_| origin + u * rng.gen_range(-5.0..5.0) + v * rng.gen_range(-width..width))
        .collect()
}

#[test]
fn nearly_collinear_planes_are_stable_under_rotation() {
    let mut rng = StdRng::seed_from_u64(21);
    for ratio in [1e-8, 1e-10, 1e-12] {
        for _ in 0..3 {
            let u = Vector::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.4)
                .normalize()
                .unwrap();
            let v = u.cross(Vector::new(0.1, 0.9, -0.3)).normalize().unwrap();
            let truth = u.cross(v);
            let points = strip(&mut rng, u, v, 3.0 * f64::sqrt(ratio));

            let transform = RigidTransform::from_axis_angle(
                Vector::new(rng.gen_range(-1.0..1.0), 1.0, rng.gen_range(-1.0..1.0)),
                rng.gen_range(0.0..std::f64::consts::TAU),
                Vector::new(4.0, 1.0, -7.0),
            );
            let moved: Vec<Point> = points.iter().map(|&p| transform.apply_point(p)).collect();

            for solver in solvers() {
                let cases = [
                    (&points, truth, u),
                    (&moved, transform.apply_vector(truth), transform.apply_vector(u)),
                ];
                for (cloud, expected, along) in cases {
                    let fit = solver.fit_plane(&PointCloud::new(cloud.clone())).unwrap();
                    let n = fit.plane().unwrap().normal;
                    let spread = fit.eigenvalues.unwrap()[1];
                    assert!(parallel(n, expected) > 1.0 - 1e-5, "ratio {ratio}: normal {n:?}");
                    assert!(fit.residual < 1e-4 * spread, "ratio {ratio}: residual {}", fit.residual);
                    for w in cloud.windows(2) {
                        assert!(n.dot(w[1] - w[0]).abs() < 1e-7, "ratio {ratio}");
                    }

                    let line = solver.fit_line(&PointCloud::new(cloud.clone())).unwrap();
                    assert!(parallel(line.line().unwrap().direction, along) > 1.0 - 1e-9);
                }
            }
        }
    }
}

#[test]
fn backends_agree_on_well_conditioned_input() {
    let mut rng = StdRng::seed_from_u64(99);
    let cloud = PointCloud::new(blob(&mut rng, 100));
    let results: Vec<_> = solvers()
        .iter()
        .map(|s| (s.fit_plane(&cloud).unwrap(), s.fit_line(&cloud).unwrap()))
        .collect();

    let (plane0, line0) = &results[0];
    for (plane, line) in &results[1..] {
        assert_eq!(plane.plane().unwrap().origin, plane0.plane().unwrap().origin);
        let (n0, n) = (plane0.plane().unwrap().normal, plane.plane().unwrap().normal);
        assert_abs_diff_eq!(n.x, n0.x, epsilon = 1e-9);
        assert_abs_diff_eq!(n.y, n0.y, epsilon = 1e-9);
        assert_abs_diff_eq!(n.z, n0.z, epsilon = 1e-9);
        let (d0, d) = (line0.line().unwrap().direction, line.line().unwrap().direction);
        assert_abs_diff_eq!(d.x, d0.x, epsilon = 1e-9);
        assert_abs_diff_eq!(d.y, d0.y, epsilon = 1e-9);
        assert_abs_diff_eq!(d.z, d0.z, epsilon = 1e-9);
        assert_relative_eq!(plane.residual, plane0.residual, max_relative = 1e-9);
        assert_relative_eq!(line.residual, line0.residual, max_relative = 1e-9);
    }
}

#[test]
fn circle_and_sphere_recover_generated_truth() {
    for kind in [FitKind::Circle, FitKind::Sphere] {
        let sample = generate_sample(&SampleSpec {
            kind,
            count: 40,
            seed: 3,
            noise: 0.0,
        })
        .unwrap();
        let cloud = PointCloud::new(sample.samples.iter().map(|s| s.point).collect());

        for solver in solvers() {
            let fit = solver.fit(kind, &cloud).unwrap();
            match (fit.primitive, sample.truth) {
                (Primitive::Circle(c), Primitive::Circle(t)) => {
                    assert_abs_diff_eq!(c.center.distance(t.center), 0.0, epsilon = 1e-8);
                    assert_relative_eq!(c.radius, t.radius, max_relative = 1e-8);
                    assert_relative_eq!(parallel(c.normal, t.normal), 1.0, epsilon = 1e-9);
                }
                (Primitive::Sphere(s), Primitive::Sphere(t)) => {
                    assert_abs_diff_eq!(s.center.distance(t.center), 0.0, epsilon = 1e-8);
                    assert_relative_eq!(s.radius, t.radius, max_relative = 1e-8);
                }
                other => panic!("unexpected primitives {other:?}"),
            }
            assert!(fit.residual < 1e-12, "residual {}", fit.residual);
        }
    }
}

#[test]
fn sampled_csv_fits_back_to_its_plane() {
    let sample = generate_sample(&SampleSpec {
        kind: FitKind::Plane,
        count: 200,
        seed: 42,
        noise: 0.001,
    })
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plane.csv");
    write_points_csv(&path, &sample.samples).unwrap();

    let ingest = load_points(&path, WeightMode::Auto).unwrap();
    assert_eq!(ingest.rows_used, 200);
    let fit = fit_plane(&ingest.cloud().unwrap()).unwrap();

    let Primitive::Plane(truth) = sample.truth else {
        panic!("expected plane truth");
    };
    let normal = fit.plane().unwrap().normal;
    assert!(parallel(normal, truth.normal) > 1.0 - 1e-4);
    assert!(fit.rms < 0.01, "rms {}", fit.rms);
}
