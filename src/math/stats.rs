//! Weighted moments of a point cloud.
//!
//! The scatter matrix is accumulated from centred coordinates (two passes:
//! centroid first, then outer products). Accumulating raw second moments and
//! subtracting the mean afterwards loses most of the precision for clouds that
//! sit far from the origin.

use crate::domain::{Point, PointCloud, Vector};
use crate::math::Sym3;

/// Weighted centroid, or `None` when the cloud is empty or has zero total weight.
pub fn centroid(cloud: &PointCloud) -> Option<Point> {
    let total = cloud.total_weight();
    if cloud.is_empty() || !(total > 0.0) {
        return None;
    }
    let mut sum = Vector::zero();
    for (p, w) in cloud.iter() {
        sum = sum + p.coords() * w;
    }
    Some(Point::origin() + sum * (1.0 / total))
}

/// `Σ wᵢ (pᵢ − c)(pᵢ − c)ᵀ`.
pub fn scatter_matrix(cloud: &PointCloud, c: Point) -> Sym3 {
    let mut s = [[0.0; 3]; 3];
    for (p, w) in cloud.iter() {
        let d = (p - c).to_array();
        for i in 0..3 {
            for j in i..3 {
                s[i][j] += w * d[i] * d[j];
            }
        }
    }
    s[1][0] = s[0][1];
    s[2][0] = s[0][2];
    s[2][1] = s[1][2];
    s
}

pub fn trace(m: &Sym3) -> f64 {
    m[0][0] + m[1][1] + m[2][2]
}

/// Largest absolute coordinate in the cloud; the length scale for tolerances.
pub fn magnitude(cloud: &PointCloud) -> f64 {
    cloud
        .points()
        .iter()
        .flat_map(|p| p.to_array())
        .fold(0.0_f64, |m, v| m.max(v.abs()))
}

/// Axis-aligned bounds, or `None` for an empty slice.
pub fn bounds(points: &[Point]) -> Option<(Point, Point)> {
    let first = *points.first()?;
    let (mut lo, mut hi) = (first, first);
    for p in &points[1..] {
        lo = Point::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z));
        hi = Point::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z));
    }
    Some((lo, hi))
}
