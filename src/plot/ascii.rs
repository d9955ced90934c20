//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Points are projected into the primitive's view frame (`models::view_frame`).
//!
//! Plot elements:
//! - points within one rms of the primitive: `o`
//! - points above/outside: `+`, below/inside: `-`
//! - outline of a circle/sphere, or the line's axis: `.`
//! - optional highlights: `A` (top above), `B` (top below)

use std::collections::HashSet;
use std::f64::consts::TAU;

use crate::domain::{FitResult, PointResidual, Primitive};
use crate::models::{local_coords, view_frame};
use crate::report::Outliers;

/// Render a plot for an in-memory fit result.
pub fn render_ascii_plot(
    residuals: &[PointResidual],
    fit: &FitResult,
    width: usize,
    height: usize,
    outliers: Option<&Outliers>,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let frame = view_frame(&fit.primitive);
    let projected: Vec<(f64, f64)> = residuals
        .iter()
        .map(|r| local_coords(&frame, r.sample.point))
        .collect();

    let outline = outline(&fit.primitive, &projected, width * 4);

    let (u_min, u_max) = axis_range(projected.iter().chain(outline.iter()).map(|p| p.0)).unwrap_or((-1.0, 1.0));
    let (v_min, v_max) = axis_range(projected.iter().chain(outline.iter()).map(|p| p.1)).unwrap_or((-1.0, 1.0));
    let (u_min, u_max) = pad_range(u_min, u_max, 0.05);
    let (v_min, v_max) = pad_range(v_min, v_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the outline first (so points can overlay).
    let mut prev = None;
    for &(u, v) in &outline {
        let x = map_x(u, u_min, u_max, width);
        let y = map_y(v, v_min, v_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(&mut grid, x0, y0, x, y, '.');
        }
        prev = Some((x, y));
    }

    // Highlight sets (indices).
    let (above_ids, below_ids): (HashSet<usize>, HashSet<usize>) = outliers
        .map(|o| {
            (
                o.above.iter().map(|r| r.index).collect(),
                o.below.iter().map(|r| r.index).collect(),
            )
        })
        .unwrap_or_default();

    let tol = fit.rms.max(1e-12);
    for (r, &(u, v)) in residuals.iter().zip(projected.iter()) {
        let x = map_x(u, u_min, u_max, width);
        let y = map_y(v, v_min, v_max, height);

        let ch = if above_ids.contains(&r.index) {
            'A'
        } else if below_ids.contains(&r.index) {
            'B'
        } else if r.distance.abs() <= tol {
            'o'
        } else if r.distance > 0.0 {
            '+'
        } else {
            '-'
        };

        grid[y][x] = ch;
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} view | u=[{u_min:.3}, {u_max:.3}] | v=[{v_min:.3}, {v_max:.3}]\n",
        fit.kind().display_name()
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

/// Polyline to draw under the points, in view-frame coordinates.
fn outline(primitive: &Primitive, projected: &[(f64, f64)], n: usize) -> Vec<(f64, f64)> {
    match primitive {
        Primitive::Circle(c) => circle_outline(c.radius, n),
        // The view frame passes through the centre, so the outline is a great circle.
        Primitive::Sphere(s) => circle_outline(s.radius, n),
        Primitive::Line(_) => match axis_range(projected.iter().map(|p| p.0)) {
            Some((u0, u1)) => vec![(u0, 0.0), (u1, 0.0)],
            None => Vec::new(),
        },
        Primitive::Plane(_) | Primitive::Frame(_) => Vec::new(),
    }
}

fn circle_outline(radius: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(8);
    (0..=n)
        .map(|i| {
            let t = TAU * i as f64 / n as f64;
            (radius * t.cos(), radius * t.sin())
        })
        .collect()
}

fn axis_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() && max.is_finite() {
        // All on one coordinate: give the axis a unit span.
        Some((min - 0.5, max + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(u: f64, u_min: f64, u_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let t = ((u - u_min) / (u_max - u_min)).clamp(0.0, 1.0);
    (t * (width as f64 - 1.0)).round() as usize
}

fn map_y(v: f64, v_min: f64, v_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let t = ((v - v_min) / (v_max - v_min)).clamp(0.0, 1.0);
    // v=top is max -> row 0
    (height as f64 - 1.0 - (t * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
