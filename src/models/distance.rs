//! Point-to-primitive evaluation.
//!
//! The reporting and drawing code relies on two primitive operations:
//! - signed distance from a point to a fitted primitive (residuals, rankings)
//! - an in-plane 2D frame for terminal plots
//!
//! Sign conventions: plane/frame are positive on the side the normal points
//! to; circle/sphere are positive outside. Line distances are never negative.

use crate::domain::{Circle, Frame, Line, Plane, Point, Primitive, Sphere, Vector};

pub fn signed_distance(primitive: &Primitive, p: Point) -> f64 {
    match primitive {
        Primitive::Plane(plane) => plane_distance(plane, p),
        Primitive::Frame(frame) => frame.zaxis.dot(p - frame.origin),
        Primitive::Line(line) => line_distance(line, p),
        Primitive::Circle(circle) => circle_distance(circle, p),
        Primitive::Sphere(sphere) => sphere_distance(sphere, p),
    }
}

pub fn plane_distance(plane: &Plane, p: Point) -> f64 {
    plane.normal.dot(p - plane.origin)
}

pub fn line_distance(line: &Line, p: Point) -> f64 {
    let d = p - line.origin;
    (d - line.direction * d.dot(line.direction)).norm()
}

/// Distance to the circle curve, signed by whether the in-plane projection
/// lies outside (`+`) or inside (`-`) the radius.
pub fn circle_distance(circle: &Circle, p: Point) -> f64 {
    let d = p - circle.center;
    let h = circle.normal.dot(d);
    let radial = (d - circle.normal * h).norm();
    let dr = radial - circle.radius;
    (h * h + dr * dr).sqrt().copysign(dr)
}

pub fn sphere_distance(sphere: &Sphere, p: Point) -> f64 {
    (p - sphere.center).norm() - sphere.radius
}

/// Deterministic orthonormal `(u, v)` completing `n` to a right-handed frame.
///
/// `u` is the world axis least aligned with `n`, orthogonalised against it.
pub fn orthonormal_basis(n: Vector) -> (Vector, Vector) {
    let a = [n.x.abs(), n.y.abs(), n.z.abs()];
    let helper = if a[0] <= a[1] && a[0] <= a[2] {
        Vector::x_axis()
    } else if a[1] <= a[2] {
        Vector::y_axis()
    } else {
        Vector::z_axis()
    };
    let u = (helper - n * helper.dot(n))
        .normalize()
        .unwrap_or(Vector::x_axis());
    let v = n.cross(u);
    (u, v)
}

/// A 2D viewing frame for a primitive: origin plus in-plane axes `(u, v)`.
///
/// - plane/circle: the plane's basis from `orthonormal_basis`
/// - frame: its own x/y axes
/// - line: `u` along the line
/// - sphere: world x/y through the centre
pub fn view_frame(primitive: &Primitive) -> Frame {
    let (origin, u, v) = match primitive {
        Primitive::Plane(plane) => {
            let (u, v) = orthonormal_basis(plane.normal);
            (plane.origin, u, v)
        }
        Primitive::Circle(circle) => {
            let (u, v) = orthonormal_basis(circle.normal);
            (circle.center, u, v)
        }
        Primitive::Frame(frame) => (frame.origin, frame.xaxis, frame.yaxis),
        Primitive::Line(line) => {
            let (v, _) = orthonormal_basis(line.direction);
            (line.origin, line.direction, v)
        }
        Primitive::Sphere(sphere) => (sphere.center, Vector::x_axis(), Vector::y_axis()),
    };
    Frame {
        origin,
        xaxis: u,
        yaxis: v,
        zaxis: u.cross(v),
    }
}

/// Coordinates of `p` in a view frame's `(u, v)` plane.
pub fn local_coords(frame: &Frame, p: Point) -> (f64, f64) {
    let d = p - frame.origin;
    (d.dot(frame.xaxis), d.dot(frame.yaxis))
}
