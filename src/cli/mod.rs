//! Command-line parsing for the pressure-transient analysis engine.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the solver/fitter code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ParamKey, parse_param_pair};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pta",
    version,
    about = "Pressure-transient analysis for multi-fractured horizontal wells"
)]
pub struct Cli {
    /// Engine config (TOML). Falls back to $PTA_CONFIG, then built-in defaults.
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Log progress at info level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the numbered model variants.
    Variants,
    /// Compute a theoretical pressure/derivative curve.
    Curve(CurveArgs),
    /// Fit model parameters to an observed curve.
    ///
    /// The fit runs in the background; each accepted iteration is printed as
    /// it arrives.
    Fit(FitArgs),
}

/// Time grid options shared by `curve` and `fit --synthetic`.
#[derive(Debug, Args, Clone)]
pub struct TimeGridArgs {
    /// First time (hours). Defaults to the solver config.
    #[arg(long)]
    pub tmin: Option<f64>,

    /// Last time (hours). Defaults to the solver config.
    #[arg(long)]
    pub tmax: Option<f64>,

    /// Log-spaced points between tmin and tmax.
    #[arg(long)]
    pub points: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    /// Catalogue id (1-36), see `pta variants`.
    #[arg(long)]
    pub variant: u8,

    /// Parameter value as key=value (name or symbol), repeatable.
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param_pair)]
    pub params: Vec<(ParamKey, f64)>,

    #[command(flatten)]
    pub grid: TimeGridArgs,

    /// Rows shown in the terminal table.
    #[arg(long, default_value_t = 25)]
    pub rows: usize,

    /// Export the curve to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the curve (variant + parameters + columns) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Catalogue id (1-36) of the model to fit.
    #[arg(long)]
    pub variant: u8,

    /// Observed data: a curve JSON produced by `pta curve --export-curve`.
    #[arg(long, value_name = "JSON", required_unless_present = "synthetic", conflicts_with = "synthetic")]
    pub observed: Option<PathBuf>,

    /// Generate observations from the model; `--truth` values override `--param`.
    #[arg(long)]
    pub synthetic: bool,

    /// True parameter values for `--synthetic`, repeatable.
    #[arg(long = "truth", value_name = "KEY=VALUE", value_parser = parse_param_pair, requires = "synthetic")]
    pub truth: Vec<(ParamKey, f64)>,

    /// Log-normal noise sigma for `--synthetic`.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Noise seed for `--synthetic`.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    #[command(flatten)]
    pub grid: TimeGridArgs,

    /// Starting / fixed parameter value as key=value, repeatable.
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param_pair)]
    pub params: Vec<(ParamKey, f64)>,

    /// Parameter to fit as key or key:min:max, repeatable.
    #[arg(long = "fit", value_name = "KEY[:MIN:MAX]", value_parser = parse_fit_spec, required = true)]
    pub fit: Vec<FitSpec>,

    /// Pressure weight in [0, 1]; the derivative gets 1 - w.
    #[arg(long, default_value_t = 0.5)]
    pub weight: f64,

    /// Maximum number of observed points used by the fitter.
    #[arg(long)]
    pub samples: Option<usize>,

    /// Export the fitted curve and the observations to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the fitted curve to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

/// One `--fit` flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSpec {
    pub key: ParamKey,
    /// Explicit bounds; derived from the starting value when absent.
    pub bounds: Option<(f64, f64)>,
}

/// Parse `key` or `key:min:max`.
pub fn parse_fit_spec(s: &str) -> Result<FitSpec, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let key: ParamKey = parts[0].parse()?;
    if key.is_derived() {
        return Err(format!("{key} is derived and cannot be fitted"));
    }
    let bounds = match parts.as_slice() {
        [_] => None,
        [_, min, max] => {
            let parse = |v: &str| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid bound for {key}: {e}"))
            };
            let (min, max) = (parse(min)?, parse(max)?);
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(format!("bounds for {key} must satisfy min < max"));
            }
            Some((min, max))
        }
        _ => return Err(format!("expected key or key:min:max, got '{s}'")),
    };
    Ok(FitSpec { key, bounds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_spec_accepts_key_and_bounds() {
        assert_eq!(
            parse_fit_spec("k").unwrap(),
            FitSpec {
                key: ParamKey::Permeability,
                bounds: None
            }
        );
        assert_eq!(
            parse_fit_spec("storage:0.01:2").unwrap().bounds,
            Some((0.01, 2.0))
        );
    }

    #[test]
    fn fit_spec_rejects_bad_input() {
        assert!(parse_fit_spec("k:1").is_err());
        assert!(parse_fit_spec("k:5:1").is_err());
        assert!(parse_fit_spec("cD").is_err());
        assert!(parse_fit_spec("nope").is_err());
    }

    #[test]
    fn cli_parses_fit_command() {
        let cli = Cli::try_parse_from([
            "pta", "--verbose", "fit", "--variant", "2", "--synthetic", "--truth", "k=5", "--fit",
            "k:0.1:100", "--fit", "S", "-p", "phi=0.05",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.variant, 2);
        assert_eq!(args.truth, vec![(ParamKey::Permeability, 5.0)]);
        assert_eq!(args.fit.len(), 2);
        assert_eq!(args.params, vec![(ParamKey::Porosity, 0.05)]);
        assert_eq!(args.weight, 0.5);
    }

    #[test]
    fn fit_requires_a_data_source() {
        assert!(Cli::try_parse_from(["pta", "fit", "--variant", "1", "--fit", "k"]).is_err());
    }
}
