//! Model solver: parameters → `(time, pressure, derivative)`.
//!
//! Pipeline for one call:
//!
//! 1. sanitize the time axis (or build the default log grid)
//! 2. preprocess the parameters into dimensionless form
//! 3. for each time point, Stehfest-invert the Laplace solution
//!    `storage_skin(bem(z))` at `tD`
//! 4. scale back to MPa and take the Bourdet derivative
//!
//! Invalid physical parameters produce an all-zero curve instead of an error.

pub mod bem;
pub mod geometry;
pub mod kernel;
pub mod stehfest;
pub mod wellbore;

pub use bem::{BoundaryElementSolver, ReservoirGeometry};
pub use stehfest::{StehfestInverter, stress_sensitive_pressure};
pub use wellbore::apply_storage_skin;

use tracing::{debug, warn};

use crate::config::{EngineConfig, SolverSettings};
use crate::data::{bourdet_derivative, log_space};
use crate::domain::{CurveResult, ModelVariant, ParamKey, ParameterSet};
use crate::models::{CompositeMedia, preprocess};

/// `tD = TIME_CONSTANT · k · t / (φ μ Ct L²)` with t in hours.
pub const TIME_CONSTANT: f64 = 3.6e-3;
/// `Δp = PRESSURE_CONSTANT · q μ B / (k h) · pD` in MPa.
pub const PRESSURE_CONSTANT: f64 = 1.842e-3;

/// Drop non-positive/non-finite times, sort, and remove duplicates.
pub fn sanitize_times(times: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = times.iter().copied().filter(|t| t.is_finite() && *t > 0.0).collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

/// Default log-spaced time grid from the solver settings.
pub fn default_times(settings: &SolverSettings) -> Vec<f64> {
    log_space(settings.time_min, settings.time_max, settings.time_points)
}

/// Everything the inversion needs, pulled out of a preprocessed set.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scales {
    /// tD per hour.
    time: f64,
    /// MPa per unit pD.
    pressure: f64,
}

fn physical_scales(p: &ParameterSet) -> Option<Scales> {
    let get = |k| p.get(k).unwrap_or(f64::NAN);
    let phi = get(ParamKey::Porosity);
    let mu = get(ParamKey::Viscosity);
    let ct = get(ParamKey::Compressibility);
    let k = get(ParamKey::Permeability);
    let h = get(ParamKey::Thickness);
    let l = get(ParamKey::WellLength);
    let q = get(ParamKey::Rate);
    let b = get(ParamKey::VolumeFactor);

    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !(positive(phi) && positive(mu) && positive(ct) && positive(k) && positive(h) && positive(l)) {
        return None;
    }
    Some(Scales {
        time: TIME_CONSTANT * k / (phi * mu * ct * l * l),
        pressure: PRESSURE_CONSTANT * q * mu * b / (k * h),
    })
}

/// Dimensionless pressure at the given dimensionless times.
///
/// Expects a parameter set that already went through [`preprocess`].
pub fn dimensionless_pressure(
    variant: &ModelVariant,
    params: &ParameterSet,
    times_d: &[f64],
    settings: &SolverSettings,
) -> Vec<f64> {
    let media = CompositeMedia::from_params(variant, params);
    let geometry = ReservoirGeometry {
        fracture_count: params.get_or(ParamKey::FractureCount, 1.0).round().max(1.0) as usize,
        fracture_half_length_d: params.get_or(ParamKey::FractureLengthD, 0.05),
        mobility_ratio: params.get_or(ParamKey::MobilityRatio, 1.0),
        composite_radius_d: params.get_or(ParamKey::CompositeRadiusD, 2.0),
        outer_radius_d: params.get_or(ParamKey::OuterRadiusD, f64::INFINITY),
    };
    let storage_d = params.get_or(ParamKey::StorageD, 0.0);
    let skin = params.get_or(ParamKey::Skin, 0.0);
    let modulus = params.get_or(ParamKey::PermeabilityModulus, 0.0);

    let bem = BoundaryElementSolver::new(media, variant.boundary, geometry, settings);
    let considered = variant.storage_considered();
    let laplace = |z: f64| {
        let pf = bem.laplace_pressure(z);
        if considered {
            apply_storage_skin(z, pf, storage_d, skin)
        } else {
            pf
        }
    };

    let inverter = StehfestInverter::new(settings.stehfest_terms());
    let mut pd = inverter.invert(laplace, times_d);
    if modulus != 0.0 {
        for v in &mut pd {
            *v = stress_sensitive_pressure(*v, modulus);
        }
    }
    pd
}

/// Compute a type curve for `variant`.
///
/// `times` are in hours; `None` uses the configured default grid. The
/// returned curve has exactly one row per sanitized time.
pub fn calculate_theoretical_curve(
    variant: &ModelVariant,
    params: &ParameterSet,
    times: Option<&[f64]>,
    config: &EngineConfig,
) -> CurveResult {
    let times = match times {
        Some(t) => sanitize_times(t),
        None => default_times(&config.solver),
    };
    if times.is_empty() {
        return CurveResult::empty();
    }

    let processed = preprocess(variant, params, &config.defaults);
    let Some(scales) = physical_scales(&processed) else {
        warn!(
            porosity = processed.get(ParamKey::Porosity),
            viscosity = processed.get(ParamKey::Viscosity),
            compressibility = processed.get(ParamKey::Compressibility),
            permeability = processed.get(ParamKey::Permeability),
            "Invalid physical parameters, returning zero curve"
        );
        return CurveResult::zeros(times);
    };

    let times_d: Vec<f64> = times.iter().map(|t| t * scales.time).collect();
    debug!(
        variant = %variant,
        points = times.len(),
        td_min = times_d[0],
        td_max = times_d[times_d.len() - 1],
        "Solving type curve"
    );

    let pressure: Vec<f64> = dimensionless_pressure(variant, &processed, &times_d, &config.solver)
        .into_iter()
        .map(|pd| pd * scales.pressure)
        .collect();
    let derivative = bourdet_derivative(&times, &pressure, config.solver.derivative_window);
    CurveResult::from_columns(times, pressure, derivative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundaryKind, MediumKind, StorageKind};

    fn quick_config() -> EngineConfig {
        let mut cfg = EngineConfig::default();
        cfg.solver.segments_per_fracture = 2;
        cfg
    }

    fn variant(storage: StorageKind) -> ModelVariant {
        ModelVariant::new(
            MediumKind::Homogeneous,
            MediumKind::Homogeneous,
            BoundaryKind::Infinite,
            storage,
        )
    }

    #[test]
    fn sanitizes_time_axis() {
        assert_eq!(sanitize_times(&[3.0, -1.0, 1.0, f64::NAN, 3.0, 0.0]), vec![1.0, 3.0]);
    }

    #[test]
    fn default_grid_is_used_without_times() {
        let cfg = EngineConfig {
            solver: SolverSettings {
                time_points: 5,
                segments_per_fracture: 1,
                ..SolverSettings::default()
            },
            ..EngineConfig::default()
        };
        let params = ParameterSet::new().with(ParamKey::FractureCount, 1.0);
        let curve = calculate_theoretical_curve(&variant(StorageKind::Ignored), &params, None, &cfg);
        assert_eq!(curve.len(), 5);
        assert!((curve.time()[0] - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn invalid_physics_yields_zero_curve() {
        let params = ParameterSet::new().with(ParamKey::Porosity, 0.0);
        let curve = calculate_theoretical_curve(
            &variant(StorageKind::Ignored),
            &params,
            Some(&[1.0, 2.0]),
            &quick_config(),
        );
        assert_eq!(curve.pressure(), &[0.0, 0.0]);
        assert_eq!(curve.derivative(), &[0.0, 0.0]);
    }

    #[test]
    fn empty_time_axis_yields_empty_curve() {
        let curve = calculate_theoretical_curve(
            &variant(StorageKind::Ignored),
            &ParameterSet::new(),
            Some(&[-1.0]),
            &quick_config(),
        );
        assert!(curve.is_empty());
    }

    #[test]
    fn storage_delays_early_pressure() {
        let params = ParameterSet::new()
            .with(ParamKey::FractureCount, 2.0)
            .with(ParamKey::Storage, 5.0);
        let times = [1e-3, 1e-2];
        let cfg = quick_config();
        let with = calculate_theoretical_curve(&variant(StorageKind::Considered), &params, Some(&times), &cfg);
        let without = calculate_theoretical_curve(&variant(StorageKind::Ignored), &params, Some(&times), &cfg);
        assert!(with.pressure()[0] < without.pressure()[0]);
        assert!(with.pressure()[0] > 0.0);
    }
}
