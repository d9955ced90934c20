//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::{KindRun, RunOutput};
use crate::domain::{FitConfig, FitFile, FitResult, Point, PointResidual, Primitive, Vector};

/// Format the full run summary (dataset stats + fit diagnostics + primitives).
pub fn format_run_summary(run: &RunOutput, config: &FitConfig) -> String {
    let mut out = String::new();
    let stats = &run.ingest.stats;

    out.push_str("=== bestfit - Best-Fit Geometry ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    out.push_str(&format!("Backend: {}\n", run.backend.name()));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        run.ingest.rows_read,
        run.ingest.rows_used,
        run.ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Points: n={} | weight={} | min={} | max={}\n",
        stats.n_points,
        fmt_num(stats.total_weight),
        fmt_point(stats.min),
        fmt_point(stats.max),
    ));
    if run.ingest.weighted {
        out.push_str("Weights: from `weight` column\n");
    }

    out.push_str("\nFit diagnostics:\n");
    for r in &run.runs {
        out.push_str(&format!(
            "  {:<8} residual={:.6e} rms={:.6e} n={}\n",
            r.kind.display_name(),
            r.result.residual,
            r.result.rms,
            r.result.n
        ));
    }
    for (kind, reason) in &run.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", kind.display_name()));
    }

    for r in &run.runs {
        out.push('\n');
        out.push_str(&format_fit(&r.result));
    }

    out
}

/// Format a single fitted primitive with its quality numbers.
pub fn format_fit(fit: &FitResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Best-fit {}:\n", fit.kind().display_name()));
    out.push_str(&format_primitive(&fit.primitive));
    out.push_str(&format!("- residual : {:.6e}\n", fit.residual));
    out.push_str(&format!("- rms      : {:.6e}\n", fit.rms));
    if let Some(values) = fit.eigenvalues {
        out.push_str(&format!("- eigen    : {}\n", fmt_vec(&values)));
    }
    out
}

/// Parameter lines for a primitive.
pub fn format_primitive(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Plane(p) => format!(
            "- origin   : {}\n- normal   : {}\n",
            fmt_point(p.origin),
            fmt_vector(p.normal)
        ),
        Primitive::Line(l) => format!(
            "- origin   : {}\n- direction: {}\n",
            fmt_point(l.origin),
            fmt_vector(l.direction)
        ),
        Primitive::Frame(f) => format!(
            "- origin   : {}\n- xaxis    : {}\n- yaxis    : {}\n- zaxis    : {}\n",
            fmt_point(f.origin),
            fmt_vector(f.xaxis),
            fmt_vector(f.yaxis),
            fmt_vector(f.zaxis)
        ),
        Primitive::Circle(c) => format!(
            "- center   : {}\n- normal   : {}\n- radius   : {}\n",
            fmt_point(c.center),
            fmt_vector(c.normal),
            fmt_num(c.radius)
        ),
        Primitive::Sphere(s) => format!(
            "- center   : {}\n- radius   : {}\n",
            fmt_point(s.center),
            fmt_num(s.radius)
        ),
    }
}

/// `show` output for a saved fit.
pub fn format_fit_file(fit: &FitFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} fit file ===\n", fit.tool));
    out.push_str(&format!("Generated: {}\n", fit.generated_at.to_rfc3339()));
    out.push_str(&format!("Source: {}\n", fit.source));
    out.push_str(&format!("Backend: {}\n", fit.backend.name()));
    out.push_str(&format!(
        "Points: n={} | weight={} | min={} | max={}\n\n",
        fit.stats.n_points,
        fmt_num(fit.stats.total_weight),
        fmt_point(fit.stats.min),
        fmt_point(fit.stats.max),
    ));
    out.push_str(&format_fit(&fit.result));
    out
}

/// Format the outlier tables for one fitted kind.
pub fn format_outliers(run: &KindRun) -> String {
    let mut out = String::new();
    let name = run.kind.display_name();

    out.push_str(&format!("Top outliers above {name} (positive distance):\n"));
    out.push_str(&format_table(&run.outliers.above));

    if run.kind != crate::domain::FitKind::Line {
        out.push('\n');
        out.push_str(&format!("Top outliers below {name} (negative distance):\n"));
        out.push_str(&format_table(&run.outliers.below));
    }

    out
}

fn format_table(rows: &[PointResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<16} {:>12} {:>12} {:>12} {:>8} {:>14}",
            "id", "x", "y", "z", "weight", "distance"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<16} {:-<12} {:-<12} {:-<12} {:-<8} {:-<14}", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        let p = r.sample.point;
        out.push_str(
            format!(
                "{:<16} {:>12.4} {:>12.4} {:>12.4} {:>8} {:>14.6}",
                truncate(&r.sample.id, 16),
                p.x,
                p.y,
                p.z,
                r.sample.weight.map(|w| format!("{w:.3}")).unwrap_or_else(|| "-".to_string()),
                r.distance,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if rows.is_empty() {
        out.push_str("(none)\n");
    }

    out
}

fn fmt_num(v: f64) -> String {
    format!("{v:.6}")
}

fn fmt_point(p: Point) -> String {
    fmt_vec(&p.to_array())
}

fn fmt_vector(v: Vector) -> String {
    fmt_vec(&v.to_array())
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
