//! Command-line parsing for the best-fit geometry tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{BackendChoice, FitKind, KindSpec, WeightMode};
use crate::draw::Rgb;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bestfit", version, about = "Best-fit planes, lines, frames, circles and spheres for 3D points")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit primitive(s) to a points CSV, print diagnostics/outliers, and optionally plot/export.
    Fit(FitArgs),
    /// Print outlier tables only (useful for scripting).
    Rank(FitArgs),
    /// Print a previously exported fit JSON.
    Show(ShowArgs),
    /// Generate a synthetic noisy point cloud around a random primitive.
    Sample(SampleArgs),
    /// Draw points (and optionally their fit) into a JSON scene.
    Draw(DrawArgs),
}

/// Common options for fitting and ranking.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Points CSV (columns x,y,z; optional id, weight). Prompts when omitted.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Which primitive(s) to fit.
    #[arg(short = 'k', long, value_enum, default_value_t = KindSpec::Plane)]
    pub kind: KindSpec,

    /// Linear algebra backend. Falls back to `BESTFIT_BACKEND`, then `auto`.
    #[arg(long, value_enum)]
    pub backend: Option<BackendChoice>,

    /// Weighting mode.
    #[arg(long, value_enum, default_value_t = WeightMode::Auto)]
    pub weights: WeightMode,

    /// Show top-N outliers on each side.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,

    /// Export per-point distances to CSV (first fitted kind).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the fit (primitive + quality + run metadata) to JSON (first fitted kind).
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,
}

/// Options for printing a saved fit.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Fit JSON file produced by `bestfit fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Primitive to sample around.
    #[arg(short = 'k', long, value_enum, default_value_t = FitKind::Plane)]
    pub kind: FitKind,

    /// Number of points.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub count: usize,

    /// Random seed (same seed, same cloud).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Gaussian noise standard deviation.
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,
}

/// Options for drawing a scene.
#[derive(Debug, Parser)]
pub struct DrawArgs {
    /// Points CSV.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Also fit and draw this primitive.
    #[arg(short = 'k', long, value_enum)]
    pub kind: Option<FitKind>,

    /// Linear algebra backend. Falls back to `BESTFIT_BACKEND`, then `auto`.
    #[arg(long, value_enum)]
    pub backend: Option<BackendChoice>,

    /// Weighting mode.
    #[arg(long, value_enum, default_value_t = WeightMode::Auto)]
    pub weights: WeightMode,

    /// Scene JSON output path.
    #[arg(short = 'o', long, value_name = "JSON")]
    pub output: PathBuf,

    /// Layer to draw into (defaults to the scene's current layer).
    #[arg(long)]
    pub layer: Option<String>,

    /// Colour as r,g,b for the points and the fitted primitive (default black).
    #[arg(long, value_name = "R,G,B")]
    pub color: Option<Rgb>,

    /// Group the drawn points, optionally under a given name.
    #[arg(long, value_name = "NAME", num_args = 0..=1)]
    pub group: Option<Option<String>>,

    /// Clear the layer before drawing.
    #[arg(long)]
    pub clear: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_fit_with_defaults() {
        let cli = Cli::parse_from(["bestfit", "-vv", "fit", "-i", "pts.csv", "--kind", "all"]);
        assert_eq!(cli.verbose, 2);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.input, Some(PathBuf::from("pts.csv")));
        assert_eq!(args.kind, KindSpec::All);
        assert_eq!(args.backend, None);
        assert_eq!(args.weights, WeightMode::Auto);
        assert!(args.plot && !args.no_plot);
    }

    #[test]
    fn group_flag_takes_an_optional_name() {
        let cli = Cli::parse_from(["bestfit", "draw", "-i", "p.csv", "-o", "s.json", "--group"]);
        let Command::Draw(args) = cli.command else {
            panic!("expected draw");
        };
        assert_eq!(args.group, Some(None));

        let cli = Cli::parse_from([
            "bestfit", "draw", "-i", "p.csv", "-o", "s.json", "--group", "cloud", "--color", "255,0,0",
        ]);
        let Command::Draw(args) = cli.command else {
            panic!("expected draw");
        };
        assert_eq!(args.group, Some(Some("cloud".to_string())));
        assert_eq!(args.color, Some(Rgb(255, 0, 0)));
    }
}
