//! Shared command pipelines.
//!
//! Keeping this separate from printing avoids duplicating the core workflow
//! and keeps it testable without spawning the binary:
//! args -> parameters/time grid -> curve, or args -> observations -> fit job.

use tracing::info;

use crate::cli::{FitArgs, FitSpec, TimeGridArgs};
use crate::config::{EngineConfig, ReservoirDefaults, SolverSettings};
use crate::data::{NoiseSpec, generate_observations, log_space};
use crate::domain::{
    CurveResult, FitParameter, ModelVariant, ObservedSeries, ParamKey, ParameterSet, SamplingSpec,
};
use crate::error::AppError;
use crate::fit::FitJob;
use crate::io::read_curve_json;
use crate::models::preprocess;
use crate::solver::calculate_theoretical_curve;

/// Outputs of a single `pta curve` run.
#[derive(Debug, Clone)]
pub struct CurveRun {
    pub variant: ModelVariant,
    /// Parameters as given on the command line (defaults are not baked in).
    pub params: ParameterSet,
    pub curve: CurveResult,
}

/// Resolve the time grid from flags, falling back to the solver settings.
pub fn time_grid(grid: &TimeGridArgs, settings: &SolverSettings) -> Result<Vec<f64>, AppError> {
    let tmin = grid.tmin.unwrap_or(settings.time_min);
    let tmax = grid.tmax.unwrap_or(settings.time_max);
    let points = grid.points.unwrap_or(settings.time_points);

    if !(tmin.is_finite() && tmin > 0.0 && tmax.is_finite() && tmax > tmin) {
        return Err(AppError::new(
            2,
            format!("Time grid needs 0 < tmin < tmax (got tmin={tmin}, tmax={tmax})."),
        ));
    }
    if points == 0 {
        return Err(AppError::new(2, "Time grid needs at least one point."));
    }
    Ok(log_space(tmin, tmax, points))
}

pub fn run_curve(
    variant_id: u8,
    pairs: &[(ParamKey, f64)],
    grid: &TimeGridArgs,
    config: &EngineConfig,
) -> Result<CurveRun, AppError> {
    let variant = ModelVariant::lookup(variant_id)?;
    let params = ParameterSet::from_pairs(pairs.iter().copied());
    let times = time_grid(grid, &config.solver)?;
    let curve = calculate_theoretical_curve(&variant, &params, Some(&times), config);
    Ok(CurveRun {
        variant,
        params,
        curve,
    })
}

/// Bounds for a `--fit key` given without explicit limits.
pub fn default_bounds(key: ParamKey, value: f64) -> (f64, f64) {
    match key {
        ParamKey::FractureCount => (1.0, (value * 4.0).max(20.0)),
        ParamKey::Skin => (value - 10.0, value + 10.0),
        ParamKey::Omega1 | ParamKey::Omega2 => (1e-4, 1.0),
        ParamKey::PermeabilityModulus => (0.0, 1.0),
        _ if value > 0.0 => (value / 100.0, value * 100.0),
        _ => (value - 1.0, value + 1.0),
    }
}

/// Fixed parameters from `--param` plus one fitted parameter per `--fit`.
///
/// Starting values of fitted keys not given with `--param` come from the
/// reservoir defaults, resolved the same way the solver resolves them.
pub fn build_fit_parameters(
    variant: &ModelVariant,
    params: &ParameterSet,
    specs: &[FitSpec],
    defaults: &ReservoirDefaults,
) -> Vec<FitParameter> {
    let resolved = preprocess(variant, params, defaults);
    let mut out: Vec<FitParameter> = params
        .iter()
        .filter(|(k, _)| !k.is_derived() && !specs.iter().any(|s| s.key == *k))
        .map(|(k, v)| FitParameter::fixed(k, v))
        .collect();

    for spec in specs {
        let value = params
            .get(spec.key)
            .or_else(|| resolved.get(spec.key))
            .unwrap_or(0.0);
        let (min, max) = spec.bounds.unwrap_or_else(|| default_bounds(spec.key, value));
        out.push(FitParameter::fitted(spec.key, value, min, max));
    }
    out
}

/// Observed series from a curve file or generated from the model.
pub fn load_observations(
    args: &FitArgs,
    variant: &ModelVariant,
    config: &EngineConfig,
) -> Result<ObservedSeries, AppError> {
    let observed = match &args.observed {
        Some(path) => {
            let file = read_curve_json(path)?;
            if file.variant != *variant {
                info!(
                    file_variant = %file.variant,
                    "Observed curve was generated with a different model"
                );
            }
            file.to_observed()
        }
        None => {
            let truth = ParameterSet::from_pairs(args.params.iter().chain(args.truth.iter()).copied());
            let times = time_grid(&args.grid, &config.solver)?;
            let noise = NoiseSpec {
                sigma: args.noise,
                seed: args.seed,
                ..NoiseSpec::default()
            };
            generate_observations(variant, &truth, &times, noise, config)?
        }
    };

    if observed.is_empty() {
        return Err(AppError::new(3, "Observed series is empty."));
    }
    Ok(observed)
}

/// Everything `pta fit` hands to the background session.
pub fn fit_job(args: &FitArgs, config: &EngineConfig) -> Result<FitJob, AppError> {
    if !(0.0..=1.0).contains(&args.weight) {
        return Err(AppError::new(
            2,
            format!("--weight must be within [0, 1] (got {}).", args.weight),
        ));
    }

    let variant = ModelVariant::lookup(args.variant)?;
    let observed = load_observations(args, &variant, config)?;
    let params = ParameterSet::from_pairs(args.params.iter().copied());
    let parameters = build_fit_parameters(&variant, &params, &args.fit, &config.defaults);

    let mut config = config.clone();
    if let Some(n) = args.samples {
        if n == 0 {
            return Err(AppError::new(2, "--samples must be at least 1."));
        }
        config.fitter.sampling = SamplingSpec::Budget(n);
    }

    Ok(FitJob {
        variant,
        parameters,
        observed,
        weight: args.weight,
        config,
    })
}
