//! Tunable settings and project-wide default parameters.
//!
//! Every struct here deserializes with `#[serde(default)]`, so a TOML file
//! only needs the values it wants to change.

use serde::{Deserialize, Serialize};

use crate::domain::SamplingSpec;
use crate::error::ConfigError;

/// Fallback values for parameters a caller did not supply.
///
/// Lifetime is one analysis session; it is passed explicitly to the
/// preprocessor rather than read from global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirDefaults {
    pub porosity: f64,
    /// m
    pub thickness: f64,
    /// mPa·s
    pub viscosity: f64,
    pub volume_factor: f64,
    /// 1/MPa
    pub compressibility: f64,
    /// m³/d
    pub rate: f64,
    /// m
    pub well_radius: f64,
    /// mD
    pub permeability: f64,
    /// m
    pub well_length: f64,
    /// m
    pub fracture_half_length: f64,
    pub fracture_count: f64,
    pub skin: f64,
    /// m³/MPa
    pub storage: f64,
    pub omega: f64,
    pub lambda: f64,
    pub diffusivity_ratio: f64,
    pub mobility_ratio: f64,
    /// Composite radius as a multiple of the well length.
    pub composite_radius_factor: f64,
    /// Outer radius as a multiple of the composite radius.
    pub outer_radius_factor: f64,
    pub permeability_modulus: f64,
}

impl Default for ReservoirDefaults {
    fn default() -> Self {
        Self {
            porosity: 0.1,
            thickness: 10.0,
            viscosity: 1.0,
            volume_factor: 1.0,
            compressibility: 1e-3,
            rate: 10.0,
            well_radius: 0.1,
            permeability: 1.0,
            well_length: 1000.0,
            fracture_half_length: 50.0,
            fracture_count: 4.0,
            skin: 0.0,
            storage: 0.1,
            omega: 0.1,
            lambda: 1e-4,
            diffusivity_ratio: 1.0,
            mobility_ratio: 1.0,
            composite_radius_factor: 2.0,
            outer_radius_factor: 4.0,
            permeability_modulus: 0.0,
        }
    }
}

/// Numerical settings of the Laplace-space solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub segments_per_fracture: usize,
    /// Stehfest term count; clamped to an even value in `4..=18`.
    pub stehfest_n: usize,
    /// Relative tolerance for segment self-influence integrals.
    pub self_tolerance: f64,
    /// Base relative tolerance for cross-segment integrals (loosened with distance).
    pub cross_tolerance: f64,
    /// Effective kernel radius is `cutoff_factor / γ1`.
    pub cutoff_factor: f64,
    pub max_quadrature_depth: usize,
    /// Above this pivot-ratio estimate the dense solve falls back to SVD.
    pub condition_limit: f64,
    /// Log-time window of the Bourdet estimator applied to model curves.
    pub derivative_window: f64,
    /// Default time grid (hours) when the caller supplies none.
    pub time_min: f64,
    pub time_max: f64,
    pub time_points: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            segments_per_fracture: 6,
            stehfest_n: 8,
            self_tolerance: 1e-10,
            cross_tolerance: 1e-6,
            cutoff_factor: 15.0,
            max_quadrature_depth: 30,
            condition_limit: 1e12,
            derivative_window: 0.0,
            time_min: 1e-3,
            time_max: 1e3,
            time_points: 60,
        }
    }
}

/// Levenberg–Marquardt settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitterSettings {
    pub max_iterations: usize,
    /// Stop once the mean squared log-residual drops below this.
    pub mse_tolerance: f64,
    pub initial_damping: f64,
    pub damping_factor: f64,
    pub max_damping: f64,
    pub trials_per_iteration: usize,
    /// Finite-difference step in log10 space for positive parameters.
    pub log_step: f64,
    /// Absolute finite-difference step for skin, counts, and non-positive values.
    pub linear_step: f64,
    pub sampling: SamplingSpec,
    /// Sampled times closer than this (relative) are merged.
    pub sampling_epsilon: f64,
}

impl Default for FitterSettings {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            mse_tolerance: 3e-3,
            initial_damping: 0.01,
            damping_factor: 10.0,
            max_damping: 1e10,
            trials_per_iteration: 5,
            log_step: 0.01,
            linear_step: 1e-4,
            sampling: SamplingSpec::Budget(200),
            sampling_epsilon: 1e-9,
        }
    }
}

impl SolverSettings {
    /// Stehfest N snapped to the supported even range.
    pub fn stehfest_terms(&self) -> usize {
        let n = self.stehfest_n.clamp(4, 18);
        n + n % 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments_per_fracture == 0 {
            return Err(ConfigError::Invalid("solver.segments_per_fracture must be >= 1".into()));
        }
        if !(self.cutoff_factor.is_finite() && self.cutoff_factor > 0.0) {
            return Err(ConfigError::Invalid("solver.cutoff_factor must be > 0".into()));
        }
        if !(self.self_tolerance > 0.0 && self.cross_tolerance > 0.0) {
            return Err(ConfigError::Invalid("solver tolerances must be > 0".into()));
        }
        if !(self.time_min > 0.0 && self.time_max > self.time_min && self.time_points >= 2) {
            return Err(ConfigError::Invalid(
                "solver default time grid needs 0 < time_min < time_max and >= 2 points".into(),
            ));
        }
        Ok(())
    }
}

impl FitterSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 || self.trials_per_iteration == 0 {
            return Err(ConfigError::Invalid(
                "fitter.max_iterations and fitter.trials_per_iteration must be >= 1".into(),
            ));
        }
        if !(self.damping_factor > 1.0 && self.initial_damping > 0.0) {
            return Err(ConfigError::Invalid(
                "fitter damping must start > 0 and grow by a factor > 1".into(),
            ));
        }
        if !(self.log_step > 0.0 && self.linear_step > 0.0) {
            return Err(ConfigError::Invalid("fitter steps must be > 0".into()));
        }
        match &self.sampling {
            SamplingSpec::Budget(0) => {
                return Err(ConfigError::Invalid("fitter.sampling.budget must be >= 1".into()));
            }
            SamplingSpec::Budget(_) => {}
            SamplingSpec::Intervals(intervals) => {
                if intervals.is_empty() {
                    return Err(ConfigError::Invalid("fitter.sampling.intervals must not be empty".into()));
                }
                let positive = |v: f64| v.is_finite() && v > 0.0;
                if let Some(bad) = intervals
                    .iter()
                    .find(|i| i.count == 0 || !positive(i.start) || !positive(i.end))
                {
                    return Err(ConfigError::Invalid(format!(
                        "fitter.sampling interval [{}, {}] needs positive times and count >= 1 (got {})",
                        bad.start, bad.end, bad.count
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SamplingInterval;

    #[test]
    fn stehfest_terms_are_even_and_bounded() {
        let mut s = SolverSettings::default();
        for (n, want) in [(0, 4), (5, 6), (8, 8), (17, 18), (40, 18)] {
            s.stehfest_n = n;
            assert_eq!(s.stehfest_terms(), want, "n={n}");
        }
    }

    #[test]
    fn defaults_validate() {
        assert!(SolverSettings::default().validate().is_ok());
        assert!(FitterSettings::default().validate().is_ok());
    }

    #[test]
    fn empty_sampling_is_rejected() {
        let mut f = FitterSettings {
            sampling: SamplingSpec::Budget(0),
            ..FitterSettings::default()
        };
        assert!(matches!(f.validate(), Err(ConfigError::Invalid(_))));

        f.sampling = SamplingSpec::Intervals(Vec::new());
        assert!(matches!(f.validate(), Err(ConfigError::Invalid(_))));

        f.sampling = SamplingSpec::Intervals(vec![
            SamplingInterval { start: 0.01, end: 1.0, count: 30 },
            SamplingInterval { start: 1.0, end: 100.0, count: 0 },
        ]);
        assert!(matches!(f.validate(), Err(ConfigError::Invalid(_))));

        f.sampling = SamplingSpec::Intervals(vec![SamplingInterval { start: 0.0, end: 1.0, count: 5 }]);
        assert!(matches!(f.validate(), Err(ConfigError::Invalid(_))));

        f.sampling = SamplingSpec::Intervals(vec![SamplingInterval { start: 0.01, end: 1.0, count: 5 }]);
        assert!(f.validate().is_ok());
    }
}
