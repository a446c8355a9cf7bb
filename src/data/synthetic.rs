//! Synthetic observations generated from the model itself.
//!
//! Useful for demos and for checking that a fit recovers known parameters:
//! the model curve is perturbed with multiplicative log-normal noise and the
//! observed derivative is recomputed from the noisy pressures, exactly as it
//! would be for gauge data.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, LogNormal};

use crate::config::EngineConfig;
use crate::domain::{ModelVariant, ObservedPoint, ObservedSeries, ParameterSet};
use crate::error::AppError;
use crate::solver::calculate_theoretical_curve;

/// How to perturb and resample a generated curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSpec {
    /// Standard deviation of `ln(noise)`; 0 gives a noiseless copy.
    pub sigma: f64,
    pub seed: u64,
    /// Bourdet window applied to the noisy pressures.
    pub derivative_window: f64,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        Self {
            sigma: 0.0,
            seed: 7,
            derivative_window: 0.1,
        }
    }
}

/// Model curve at `times` turned into an observed series.
pub fn generate_observations(
    variant: &ModelVariant,
    params: &ParameterSet,
    times: &[f64],
    noise: NoiseSpec,
    config: &EngineConfig,
) -> Result<ObservedSeries, AppError> {
    if !(noise.sigma.is_finite() && noise.sigma >= 0.0) {
        return Err(AppError::new(2, format!("Noise sigma must be >= 0 (got {}).", noise.sigma)));
    }

    let curve = calculate_theoretical_curve(variant, params, Some(times), config);
    if curve.is_empty() {
        return Err(AppError::new(3, "No valid time points to generate observations for."));
    }

    let mut points: Vec<ObservedPoint> = curve
        .rows()
        .map(|(time, pressure, derivative)| ObservedPoint {
            time,
            pressure,
            derivative,
        })
        .collect();

    if noise.sigma > 0.0 {
        let mut rng = StdRng::seed_from_u64(noise.seed);
        let dist = LogNormal::new(0.0, noise.sigma)
            .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
        for p in &mut points {
            p.pressure *= dist.sample(&mut rng);
        }
    }

    Ok(ObservedSeries::new(points).with_bourdet_derivative(noise.derivative_window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::log_space;
    use crate::domain::{BoundaryKind, MediumKind, ParamKey, StorageKind};

    fn setup() -> (ModelVariant, ParameterSet, EngineConfig) {
        let variant = ModelVariant::new(
            MediumKind::Homogeneous,
            MediumKind::Homogeneous,
            BoundaryKind::Infinite,
            StorageKind::Ignored,
        );
        let params = ParameterSet::new().with(ParamKey::FractureCount, 2.0);
        let mut config = EngineConfig::default();
        config.solver.segments_per_fracture = 2;
        (variant, params, config)
    }

    #[test]
    fn same_seed_same_noise() {
        let (v, p, c) = setup();
        let t = log_space(0.1, 10.0, 8);
        let noise = NoiseSpec {
            sigma: 0.05,
            ..NoiseSpec::default()
        };
        let a = generate_observations(&v, &p, &t, noise, &c).unwrap();
        let b = generate_observations(&v, &p, &t, noise, &c).unwrap();
        assert_eq!(a, b);

        let clean = generate_observations(&v, &p, &t, NoiseSpec::default(), &c).unwrap();
        assert_ne!(a, clean);
        assert_eq!(a.len(), clean.len());
    }

    #[test]
    fn rejects_bad_sigma_and_empty_times() {
        let (v, p, c) = setup();
        let bad = NoiseSpec {
            sigma: -1.0,
            ..NoiseSpec::default()
        };
        assert_eq!(generate_observations(&v, &p, &[1.0], bad, &c).unwrap_err().exit_code(), 2);
        assert_eq!(
            generate_observations(&v, &p, &[], NoiseSpec::default(), &c)
                .unwrap_err()
                .exit_code(),
            3
        );
    }
}
