//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and environment
//! - initializes logging
//! - runs fits / sample generation / scene drawing
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DrawArgs, FitArgs, SampleArgs, ShowArgs};
use crate::domain::{BackendChoice, FitConfig, FitResult, PointCloud};
use crate::draw::{CollectionOptions, ColorSpec, FitArtist, PointArtist, SceneCanvas};
use crate::error::AppError;

pub mod pipeline;

/// Environment variable consulted when `--backend` is not given.
pub const BACKEND_ENV: &str = "BESTFIT_BACKEND";

/// Entry point for the `bestfit` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args, OutputMode::Full),
        Command::Rank(args) => handle_fit(args, OutputMode::RankOnly),
        Command::Show(args) => handle_show(args),
        Command::Sample(args) => handle_sample(args),
        Command::Draw(args) => handle_draw(args),
    }
}

/// Log to stderr so stdout stays clean for reports.
///
/// `RUST_LOG` wins when set; otherwise the level comes from `-v` count.
fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. in tests) is harmless; ignore it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    RankOnly,
}

fn handle_fit(args: FitArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = fit_config_from_args(&args, std::env::var(BACKEND_ENV).ok().as_deref())?;
    let run = pipeline::run_fit(&config)?;

    if mode == OutputMode::Full {
        println!("{}", crate::report::format_run_summary(&run, &config));
    }

    for kind_run in &run.runs {
        println!("{}", crate::report::format_outliers(kind_run));
    }

    if mode == OutputMode::Full && config.plot {
        for kind_run in &run.runs {
            let plot = crate::plot::render_ascii_plot(
                &kind_run.residuals,
                &kind_run.result,
                config.plot_width,
                config.plot_height,
                Some(&kind_run.outliers),
            );
            println!("{plot}");
        }
    }

    // Optional exports (first successful kind).
    if let Some(primary) = run.primary() {
        if let Some(path) = &config.export_residuals {
            crate::io::write_residuals_csv(path, &primary.residuals)?;
            tracing::info!(path = %path.display(), "wrote residual CSV");
        }
        if let Some(path) = &config.export_fit {
            let fit = crate::io::fit_file(&primary.result, &run.ingest.stats, &config.csv_path);
            crate::io::write_fit_json(path, &fit)?;
            tracing::info!(path = %path.display(), "wrote fit JSON");
        }
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let fit = crate::io::read_fit_json(&args.fit)?;
    println!("{}", crate::report::format_fit_file(&fit));
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = crate::data::SampleSpec {
        kind: args.kind,
        count: args.count,
        seed: args.seed,
        noise: args.noise,
    };
    let sample = crate::data::generate_sample(&spec)?;
    crate::io::write_points_csv(&args.output, &sample.samples)?;

    println!(
        "Wrote {} {} points to {}",
        sample.samples.len(),
        spec.kind.display_name(),
        args.output.display()
    );
    println!("{}", crate::report::format_primitive(&sample.truth));
    Ok(())
}

fn handle_draw(args: DrawArgs) -> Result<(), AppError> {
    let ingest = crate::io::load_points(&args.input, args.weights)?;
    let cloud = ingest.cloud()?;

    let fit = match args.kind {
        Some(kind) => {
            let backend = resolve_backend_choice(args.backend, std::env::var(BACKEND_ENV).ok().as_deref())?;
            let solver = crate::fit::BestFitSolver::from_choice(backend)?;
            Some(solver.fit(kind, &cloud)?)
        }
        None => None,
    };

    let canvas = build_scene(&args, &cloud, fit.as_ref());
    canvas.write(&args.output)?;
    println!("Wrote scene with {} object(s) to {}", canvas.objects.len(), args.output.display());
    Ok(())
}

/// Points first, then the fitted primitive on the same layer in the same colour.
fn build_scene(args: &DrawArgs, cloud: &PointCloud, fit: Option<&FitResult>) -> SceneCanvas {
    let mut canvas = SceneCanvas::new();
    let options = CollectionOptions {
        color: args.color.map(ColorSpec::Single).unwrap_or_default(),
        layer: args.layer.clone(),
        clear: args.clear,
        group: args.group.is_some(),
        group_name: args.group.clone().flatten(),
    };
    let drawn = PointArtist::draw_cloud(&mut canvas, cloud, &options);
    tracing::debug!(?drawn, "drew points");

    if let Some(fit) = fit {
        let mut artist = FitArtist::new(fit, args.layer.as_deref());
        if let Some(color) = args.color {
            artist = artist.with_color(color);
        }
        artist.draw(&mut canvas);
    }
    canvas
}

/// `--backend` wins; otherwise the environment value; otherwise `auto`.
///
/// An unrecognised environment value is a configuration error.
pub fn resolve_backend_choice(flag: Option<BackendChoice>, env_value: Option<&str>) -> Result<BackendChoice, AppError> {
    if let Some(choice) = flag {
        return Ok(choice);
    }
    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(BackendChoice::Auto),
        Some(v) => BackendChoice::from_env_value(Some(v)).ok_or_else(|| {
            AppError::new(
                2,
                format!("Invalid {BACKEND_ENV}='{v}' (expected auto, native or jacobi)."),
            )
        }),
    }
}

pub fn fit_config_from_args(args: &FitArgs, backend_env: Option<&str>) -> Result<FitConfig, AppError> {
    let csv_path = match &args.input {
        Some(path) => path.clone(),
        None => crate::cli::picker::prompt_for_csv_path()?,
    };

    Ok(FitConfig {
        csv_path,
        kinds: args.kind.kinds(),
        backend: resolve_backend_choice(args.backend, backend_env)?,
        weight_mode: args.weights,
        top_n: args.top,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_residuals: args.export.clone(),
        export_fit: args.export_fit.clone(),
    })
}
