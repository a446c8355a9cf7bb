//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - resolves the engine config
//! - computes curves or runs a background fit
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, CurveArgs, FitArgs};
use crate::config::EngineConfig;
use crate::domain::CurveFile;
use crate::error::AppError;
use crate::fit::{FitController, FitEvent, FitOutcome, to_parameter_set};
use crate::io::{write_curve_csv, write_curve_json};
use crate::report;

pub mod pipeline;

/// Entry point for the `pta` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Variants => {
            print!("{}", report::format_variant_catalogue());
            Ok(())
        }
        Command::Curve(args) => handle_curve(&args, &config),
        Command::Fit(args) => handle_fit(&args, &config),
    }
}

/// `RUST_LOG` wins; otherwise `info` with `--verbose` and `warn` without.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // A second init (e.g. from a test harness) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_curve(args: &CurveArgs, config: &EngineConfig) -> Result<(), AppError> {
    let run = pipeline::run_curve(args.variant, &args.params, &args.grid, config)?;

    print!("{}", report::format_curve_summary(&run.variant, &run.params, &run.curve));
    print!("{}", report::format_curve_table(&run.curve, args.rows));

    if let Some(path) = &args.export_csv {
        write_curve_csv(path, &run.curve, None)?;
        info!(path = %path.display(), "Wrote curve CSV");
    }
    if let Some(path) = &args.export_curve {
        let file = CurveFile::new(run.variant, run.params.clone(), run.curve.clone());
        write_curve_json(path, &file)?;
        info!(path = %path.display(), "Wrote curve JSON");
    }
    Ok(())
}

fn handle_fit(args: &FitArgs, config: &EngineConfig) -> Result<(), AppError> {
    let job = pipeline::fit_job(args, config)?;
    let variant = job.variant;
    let observed = job.observed.clone();
    let weight = job.weight;

    let mut controller = FitController::new();
    let events = controller.start(job)?;

    let mut finished: Option<FitOutcome> = None;
    for event in events {
        match event {
            FitEvent::Started {
                samples,
                free_parameters,
            } => println!("Fitting {free_parameters} parameter(s) on {samples} sampled point(s)"),
            FitEvent::Progress(_) => {}
            FitEvent::Iteration {
                iteration,
                mse,
                parameters,
                ..
            } => println!("{}", report::format_iteration(iteration, mse, &parameters)),
            FitEvent::Finished(outcome) => finished = Some(outcome),
        }
    }

    let joined = controller.join();
    let outcome = finished
        .or(joined)
        .ok_or_else(|| AppError::new(4, "Fit ended without a result."))?;

    let diagnostics = report::diagnose(&observed, &outcome.curve, weight);
    println!();
    print!("{}", report::format_fit_summary(&outcome, &variant, &diagnostics));

    if let Some(path) = &args.export_csv {
        write_curve_csv(path, &outcome.curve, Some(&observed))?;
        info!(path = %path.display(), "Wrote fit CSV");
    }
    if let Some(path) = &args.export_curve {
        let file = CurveFile::new(variant, to_parameter_set(&outcome.parameters), outcome.curve.clone());
        write_curve_json(path, &file)?;
        info!(path = %path.display(), "Wrote fitted curve JSON");
    }
    Ok(())
}
