//! Synthetic point-cloud generation around a known primitive.
//!
//! Points are generated in a local frame (primitive at the origin, normal or
//! axis along z/x) and then moved by a random rigid transform, so the output
//! exercises arbitrary orientations. Same seed, same cloud.

use std::f64::consts::TAU;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    Circle, FitKind, Frame, Line, Plane, Point, Primitive, RigidTransform, SamplePoint, Sphere, Vector,
};
use crate::error::AppError;

/// Half-extent of the generated patch along each in-plane axis.
const EXTENT: f64 = 5.0;

/// Inputs for `generate_sample`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSpec {
    pub kind: FitKind,
    pub count: usize,
    pub seed: u64,
    /// Standard deviation of the gaussian noise added to each point.
    pub noise: f64,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub samples: Vec<SamplePoint>,
    /// The primitive the points were generated around.
    pub truth: Primitive,
    pub transform: RigidTransform,
}

pub fn generate_sample(spec: &SampleSpec) -> Result<SampleData, AppError> {
    if spec.count < spec.kind.min_points() {
        return Err(AppError::new(
            2,
            format!(
                "A {} sample needs at least {} points (got {}).",
                spec.kind.display_name(),
                spec.kind.min_points(),
                spec.count
            ),
        ));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be a finite, non-negative number."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let transform = random_transform(&mut rng, &normal);
    let radius = rng.gen_range(1.0..EXTENT);

    let mut samples = Vec::with_capacity(spec.count);
    for i in 0..spec.count {
        let local = match spec.kind {
            FitKind::Plane => {
                let u = rng.gen_range(-EXTENT..=EXTENT);
                let v = rng.gen_range(-EXTENT..=EXTENT);
                Point::new(u, v, jitter(&mut rng, &normal, spec.noise))
            }
            FitKind::Line => {
                let t = rng.gen_range(-EXTENT..=EXTENT);
                Point::new(
                    t,
                    jitter(&mut rng, &normal, spec.noise),
                    jitter(&mut rng, &normal, spec.noise),
                )
            }
            // Elongated patch so the in-plane axes are well separated.
            FitKind::Frame => {
                let u = rng.gen_range(-EXTENT..=EXTENT);
                let v = rng.gen_range(-EXTENT / 3.0..=EXTENT / 3.0);
                Point::new(u, v, jitter(&mut rng, &normal, spec.noise))
            }
            FitKind::Circle => {
                let t = rng.gen_range(0.0..TAU);
                let r = radius + jitter(&mut rng, &normal, spec.noise);
                Point::new(r * t.cos(), r * t.sin(), jitter(&mut rng, &normal, spec.noise))
            }
            FitKind::Sphere => {
                let dir = random_direction(&mut rng, &normal);
                let r = radius + jitter(&mut rng, &normal, spec.noise);
                Point::origin() + dir * r
            }
        };

        samples.push(SamplePoint {
            id: format!("{}-{:03}", spec.kind.display_name(), i + 1),
            point: transform.apply_point(local),
            weight: None,
        });
    }

    let truth = truth_primitive(spec.kind, &transform, radius);
    tracing::debug!(kind = spec.kind.display_name(), count = spec.count, seed = spec.seed, "generated sample");

    Ok(SampleData {
        samples,
        truth,
        transform,
    })
}

fn truth_primitive(kind: FitKind, transform: &RigidTransform, radius: f64) -> Primitive {
    let origin = transform.apply_point(Point::origin());
    let x = transform.apply_vector(Vector::x_axis());
    let y = transform.apply_vector(Vector::y_axis());
    let z = transform.apply_vector(Vector::z_axis());
    match kind {
        FitKind::Plane => Primitive::Plane(Plane {
            origin,
            normal: z.canonical_sign(),
        }),
        FitKind::Line => Primitive::Line(Line {
            origin,
            direction: x.canonical_sign(),
        }),
        FitKind::Frame => Primitive::Frame(Frame {
            origin,
            xaxis: x,
            yaxis: y,
            zaxis: z,
        }),
        FitKind::Circle => Primitive::Circle(Circle {
            center: origin,
            normal: z.canonical_sign(),
            radius,
        }),
        FitKind::Sphere => Primitive::Sphere(Sphere { center: origin, radius }),
    }
}

fn random_transform(rng: &mut StdRng, normal: &Normal<f64>) -> RigidTransform {
    let axis = random_direction(rng, normal);
    let angle = rng.gen_range(0.0..TAU);
    let translation = Vector::new(
        rng.gen_range(-10.0..=10.0),
        rng.gen_range(-10.0..=10.0),
        rng.gen_range(-10.0..=10.0),
    );
    RigidTransform::from_axis_angle(axis, angle, translation)
}

fn jitter(rng: &mut StdRng, normal: &Normal<f64>, sigma: f64) -> f64 {
    sigma * normal.sample(rng)
}

/// Uniform direction on the unit sphere (normalised gaussian triple).
fn random_direction(rng: &mut StdRng, normal: &Normal<f64>) -> Vector {
    loop {
        let v = Vector::new(normal.sample(rng), normal.sample(rng), normal.sample(rng));
        if let Some(d) = v.normalize() {
            return d;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: FitKind, count: usize, noise: f64) -> SampleSpec {
        SampleSpec {
            kind,
            count,
            seed: 7,
            noise,
        }
    }

    #[test]
    fn same_seed_same_cloud() {
        let a = generate_sample(&spec(FitKind::Sphere, 20, 0.01)).unwrap();
        let b = generate_sample(&spec(FitKind::Sphere, 20, 0.01)).unwrap();
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.truth, b.truth);
    }

    #[test]
    fn noiseless_plane_points_lie_on_truth() {
        let data = generate_sample(&spec(FitKind::Plane, 50, 0.0)).unwrap();
        let Primitive::Plane(plane) = data.truth else {
            panic!("expected plane truth");
        };
        for s in &data.samples {
            let d = (s.point - plane.origin).dot(plane.normal);
            assert!(d.abs() < 1e-9, "distance {d}");
        }
        assert_eq!(data.samples[0].id, "plane-001");
    }

    #[test]
    fn noiseless_sphere_points_lie_on_truth() {
        let data = generate_sample(&spec(FitKind::Sphere, 30, 0.0)).unwrap();
        let Primitive::Sphere(sphere) = data.truth else {
            panic!("expected sphere truth");
        };
        for s in &data.samples {
            assert!((s.point.distance(sphere.center) - sphere.radius).abs() < 1e-9);
        }
    }

    #[test]
    fn too_few_points_is_rejected() {
        let err = generate_sample(&spec(FitKind::Sphere, 3, 0.0)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn negative_noise_is_rejected() {
        assert!(generate_sample(&spec(FitKind::Line, 10, -1.0)).is_err());
    }
}
