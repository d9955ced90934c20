//! Rigid transformations (rotation + translation).

use serde::{Deserialize, Serialize};

use crate::domain::{Point, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// Row-major rotation matrix.
    pub rotation: [[f64; 3]; 3],
    pub translation: Vector,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: Vector::zero(),
        }
    }

    pub fn translation(t: Vector) -> Self {
        Self {
            translation: t,
            ..Self::identity()
        }
    }

    /// Rotation by `angle` radians about `axis` (Rodrigues), followed by `translation`.
    ///
    /// A zero axis yields a pure translation.
    pub fn from_axis_angle(axis: Vector, angle: f64, translation: Vector) -> Self {
        let Some(k) = axis.normalize() else {
            return Self::translation(translation);
        };
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let rotation = [
            [
                c + k.x * k.x * t,
                k.x * k.y * t - k.z * s,
                k.x * k.z * t + k.y * s,
            ],
            [
                k.y * k.x * t + k.z * s,
                c + k.y * k.y * t,
                k.y * k.z * t - k.x * s,
            ],
            [
                k.z * k.x * t - k.y * s,
                k.z * k.y * t + k.x * s,
                c + k.z * k.z * t,
            ],
        ];
        Self {
            rotation,
            translation,
        }
    }

    pub fn apply_vector(&self, v: Vector) -> Vector {
        let r = &self.rotation;
        Vector::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    pub fn apply_point(&self, p: Point) -> Point {
        Point::origin() + self.apply_vector(p.coords()) + self.translation
    }
}
