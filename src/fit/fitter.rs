//! Levenberg–Marquardt fit of a model variant to observed data.
//!
//! Given:
//! - a model variant and its parameter list (some marked for fitting)
//! - an observed pressure/derivative series
//! - a pressure/derivative weight `w`
//!
//! we reduce the observations to a bounded log-spaced sample and then run
//! damped Gauss–Newton steps on the log-ratio residuals until the mean
//! squared error drops below tolerance, the caller cancels, the damping runs
//! away, or the iteration budget is spent.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::data::sample_observations;
use crate::domain::{CurveResult, FitParameter, ModelVariant, ObservedSeries, ParameterSet};
use crate::fit::residuals::{mean_squared_error, residuals, sum_of_squares};
use crate::fit::session::{CancelToken, FitEvent, FitJob, FitOutcome, FitStatus};
use crate::fit::steps::{StepConvention, constrain};
use crate::math::solve_dense;
use crate::solver::calculate_theoretical_curve;

/// Name→value view of a parameter list.
pub fn to_parameter_set(params: &[FitParameter]) -> ParameterSet {
    ParameterSet::from_pairs(params.iter().map(|p| (p.key, p.value)))
}

/// Model evaluation against one fixed set of observations.
struct Objective<'a> {
    variant: &'a ModelVariant,
    observed: &'a ObservedSeries,
    times: Vec<f64>,
    weight: f64,
    config: &'a EngineConfig,
}

impl Objective<'_> {
    fn curve(&self, params: &[FitParameter]) -> CurveResult {
        calculate_theoretical_curve(self.variant, &to_parameter_set(params), Some(&self.times), self.config)
    }

    fn residuals_of(&self, curve: &CurveResult) -> Vec<f64> {
        residuals(self.observed, curve, self.weight)
    }

    fn residuals(&self, params: &[FitParameter]) -> Vec<f64> {
        self.residuals_of(&self.curve(params))
    }
}

/// Mutable state of one run.
#[derive(Debug, Clone)]
pub struct FitSession {
    pub parameters: Vec<FitParameter>,
    pub residuals: Vec<f64>,
    pub sse: f64,
    pub mse: f64,
    pub damping: f64,
    pub iteration: usize,
    /// Parameter values the cached Jacobian was built at.
    jacobian_at: Option<(Vec<f64>, DMatrix<f64>)>,
}

fn values(params: &[FitParameter]) -> Vec<f64> {
    params.iter().map(|p| p.value).collect()
}

/// Clamp fitted values into their bounds, logging any change.
fn snapshot_parameters(params: &[FitParameter]) -> Vec<FitParameter> {
    params
        .iter()
        .map(|p| {
            let mut p = p.clone();
            if p.is_fit {
                let clamped = constrain(&p, p.value);
                if clamped != p.value {
                    warn!(parameter = %p.key, value = p.value, clamped, "Start value outside bounds");
                    p.value = clamped;
                }
            }
            p
        })
        .collect()
}

/// Central-difference Jacobian, one column per free parameter, in parallel.
fn jacobian(
    objective: &Objective<'_>,
    params: &[FitParameter],
    free: &[usize],
    steps: &StepConvention,
    rows: usize,
) -> DMatrix<f64> {
    let columns: Vec<Vec<f64>> = free
        .par_iter()
        .map(|&idx| {
            let p = &params[idx];
            let (plus, minus, _) = steps.probe(p.key, p.value);
            let (plus, minus) = (p.clamp_value(plus), p.clamp_value(minus));
            // A bound collapses one side of the difference.
            let spacing = steps.spacing(p.key, p.value, plus, minus);
            if !(spacing.is_finite() && spacing > 0.0) {
                return vec![0.0; rows];
            }

            let mut hi = params.to_vec();
            hi[idx].value = plus;
            let mut lo = params.to_vec();
            lo[idx].value = minus;

            let r_hi = objective.residuals(&hi);
            let r_lo = objective.residuals(&lo);
            r_hi.iter().zip(&r_lo).map(|(a, b)| (a - b) / spacing).collect()
        })
        .collect();

    DMatrix::from_fn(rows, free.len(), |r, c| columns[c].get(r).copied().unwrap_or(0.0))
}

fn progress_percent(iteration: usize, max_iterations: usize) -> u8 {
    let pct = (100 * iteration) / max_iterations.max(1);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Run the Levenberg–Marquardt loop to completion on the current thread.
///
/// Events are delivered to `sink` in order; the final [`FitEvent::Finished`]
/// carries the same outcome that is returned.
pub fn run_fit(job: &FitJob, cancel: &CancelToken, sink: &mut dyn FnMut(FitEvent)) -> FitOutcome {
    let settings = &job.config.fitter;
    let steps = StepConvention::from_settings(settings);

    let sampled = sample_observations(&job.observed, &settings.sampling, settings.sampling_epsilon);
    let objective = Objective {
        variant: &job.variant,
        observed: &sampled,
        times: sampled.times(),
        weight: job.weight,
        config: &job.config,
    };

    let parameters = snapshot_parameters(&job.parameters);
    let free: Vec<usize> = parameters
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_free())
        .map(|(i, _)| i)
        .collect();

    sink(FitEvent::Started {
        samples: sampled.len(),
        free_parameters: free.len(),
    });
    info!(
        variant = %job.variant,
        samples = sampled.len(),
        observed = job.observed.len(),
        free = free.len(),
        weight = job.weight,
        "Starting Levenberg-Marquardt fit"
    );

    if sampled.is_empty() {
        warn!("No usable observations, nothing to fit");
        let outcome = FitOutcome {
            status: FitStatus::Stalled,
            iterations: 0,
            mse: f64::INFINITY,
            curve: CurveResult::empty(),
            parameters,
        };
        sink(FitEvent::Finished(outcome.clone()));
        return outcome;
    }

    let residuals0 = objective.residuals(&parameters);
    let sse0 = sum_of_squares(&residuals0);
    let mut session = FitSession {
        parameters,
        residuals: residuals0,
        sse: sse0,
        mse: mean_squared_error(sse0, sampled.len()),
        damping: settings.initial_damping,
        iteration: 0,
        jacobian_at: None,
    };

    let mut status = None;
    while session.iteration < settings.max_iterations {
        if cancel.is_cancelled() {
            status = Some(FitStatus::Cancelled);
            break;
        }
        if session.mse < settings.mse_tolerance {
            status = Some(FitStatus::Converged);
            break;
        }
        sink(FitEvent::Progress(progress_percent(session.iteration, settings.max_iterations)));
        if free.is_empty() {
            status = Some(FitStatus::Stalled);
            break;
        }

        let current = values(&session.parameters);
        let j = match &session.jacobian_at {
            Some((at, j)) if *at == current => j.clone(),
            _ => {
                let j = jacobian(&objective, &session.parameters, &free, &steps, session.residuals.len());
                session.jacobian_at = Some((current, j.clone()));
                j
            }
        };
        let r = DVector::from_column_slice(&session.residuals);
        let h = j.transpose() * &j;
        let neg_g = -(j.transpose() * &r);

        session.iteration += 1;
        let mut accepted = false;
        for trial in 0..settings.trials_per_iteration {
            let mut damped = h.clone();
            for d in 0..free.len() {
                damped[(d, d)] += session.damping * (1.0 + h[(d, d)].abs());
            }
            let Some(delta) = solve_dense(&damped, &neg_g, job.config.solver.condition_limit) else {
                session.damping *= settings.damping_factor;
                continue;
            };

            let mut candidate = session.parameters.clone();
            for (c, &idx) in free.iter().enumerate() {
                let p = &session.parameters[idx];
                candidate[idx].value = constrain(p, steps.apply(p.key, p.value, delta[c]));
            }

            let curve = objective.curve(&candidate);
            let trial_residuals = objective.residuals_of(&curve);
            let trial_sse = sum_of_squares(&trial_residuals);
            debug!(
                iteration = session.iteration,
                trial,
                damping = session.damping,
                sse = trial_sse,
                current = session.sse,
                "Trial step"
            );

            if trial_sse < session.sse {
                session.parameters = candidate;
                session.residuals = trial_residuals;
                session.sse = trial_sse;
                session.mse = mean_squared_error(trial_sse, sampled.len());
                session.damping /= settings.damping_factor;
                accepted = true;

                info!(iteration = session.iteration, mse = session.mse, "Accepted step");
                sink(FitEvent::Iteration {
                    iteration: session.iteration,
                    mse: session.mse,
                    parameters: session.parameters.clone(),
                    curve,
                });
                break;
            }
            session.damping *= settings.damping_factor;
        }

        if !accepted && session.damping > settings.max_damping {
            status = Some(FitStatus::Stalled);
            break;
        }
    }

    let status = status.unwrap_or(if session.mse < settings.mse_tolerance {
        FitStatus::Converged
    } else {
        FitStatus::MaxIterReached
    });

    let full_times = job.observed.times();
    let curve = calculate_theoretical_curve(
        &job.variant,
        &to_parameter_set(&session.parameters),
        Some(&full_times),
        &job.config,
    );
    info!(
        status = status.display_name(),
        iterations = session.iteration,
        mse = session.mse,
        "Fit finished"
    );

    let outcome = FitOutcome {
        status,
        iterations: session.iteration,
        mse: session.mse,
        parameters: session.parameters,
        curve,
    };
    sink(FitEvent::Finished(outcome.clone()));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundaryKind, MediumKind, ObservedPoint, ParamKey, StorageKind};

    fn variant() -> ModelVariant {
        ModelVariant::new(
            MediumKind::Homogeneous,
            MediumKind::Homogeneous,
            BoundaryKind::Infinite,
            StorageKind::Ignored,
        )
    }

    fn quick_config() -> EngineConfig {
        let mut cfg = EngineConfig::default();
        cfg.solver.segments_per_fracture = 1;
        cfg.fitter.max_iterations = 3;
        cfg
    }

    fn observed() -> ObservedSeries {
        ObservedSeries::new(
            [0.1, 1.0, 10.0]
                .iter()
                .map(|&t| ObservedPoint {
                    time: t,
                    pressure: t,
                    derivative: 0.5 * t,
                })
                .collect(),
        )
    }

    fn job(parameters: Vec<FitParameter>) -> FitJob {
        FitJob {
            variant: variant(),
            parameters,
            observed: observed(),
            weight: 0.5,
            config: quick_config(),
        }
    }

    #[test]
    fn progress_is_bounded() {
        assert_eq!(progress_percent(0, 50), 0);
        assert_eq!(progress_percent(25, 50), 50);
        assert_eq!(progress_percent(80, 50), 100);
        assert_eq!(progress_percent(1, 0), 100);
    }

    #[test]
    fn cancelled_before_start_returns_initial_parameters() {
        let params = vec![
            FitParameter::fitted(ParamKey::Permeability, 2.0, 0.1, 10.0),
            FitParameter::fixed(ParamKey::FractureCount, 1.0),
        ];
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut events = Vec::new();
        let outcome = run_fit(&job(params.clone()), &cancel, &mut |e| events.push(e));
        assert_eq!(outcome.status, FitStatus::Cancelled);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.parameters, params);
        assert_eq!(outcome.curve.len(), 3);
        assert!(matches!(events.first(), Some(FitEvent::Started { samples: 3, free_parameters: 1 })));
        assert!(matches!(events.last(), Some(FitEvent::Finished(_))));
    }

    #[test]
    fn out_of_bounds_start_is_clamped() {
        let params = vec![FitParameter {
            value: 50.0,
            ..FitParameter::fitted(ParamKey::Permeability, 1.0, 0.1, 10.0)
        }];
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = run_fit(&job(params), &cancel, &mut |_| {});
        assert_eq!(outcome.parameters[0].value, 10.0);
    }

    #[test]
    fn nothing_free_stalls_immediately() {
        let params = vec![FitParameter::fixed(ParamKey::Permeability, 2.0)];
        let mut job = job(params);
        job.config.fitter.mse_tolerance = 0.0;
        let outcome = run_fit(&job, &CancelToken::new(), &mut |_| {});
        assert_eq!(outcome.status, FitStatus::Stalled);
    }

    #[test]
    fn permeability_column_at_bound_matches_interior_column() {
        let cfg = quick_config();
        let obs = observed();
        let v = variant();
        let objective = Objective {
            variant: &v,
            observed: &obs,
            times: obs.times(),
            weight: 0.5,
            config: &cfg,
        };
        let steps = StepConvention::from_settings(&cfg.fitter);
        let column = |max: f64| {
            let mut params: Vec<FitParameter> = [
                (ParamKey::Porosity, 0.05),
                (ParamKey::Thickness, 10.0),
                (ParamKey::Viscosity, 5.0),
                (ParamKey::VolumeFactor, 1.2),
                (ParamKey::Compressibility, 0.05),
                (ParamKey::Rate, 10.0),
                (ParamKey::WellLength, 500.0),
                (ParamKey::FractureHalfLength, 50.0),
                (ParamKey::FractureCount, 2.0),
            ]
            .into_iter()
            .map(|(k, v)| FitParameter::fixed(k, v))
            .collect();
            params.push(FitParameter::fitted(ParamKey::Permeability, 10.0, 0.1, max));
            let free = [params.len() - 1];
            jacobian(&objective, &params, &free, &steps, 2 * obs.len())
        };

        let interior = column(100.0);
        let at_bound = column(10.0);
        let scale = interior.iter().map(|v| v.abs()).fold(0.0, f64::max);
        assert!(scale > 0.0);
        for (a, b) in at_bound.iter().zip(interior.iter()) {
            assert!((a - b).abs() < 0.05 * scale, "{a} vs {b}");
        }
    }

    #[test]
    fn empty_observations_finish_without_iterating() {
        let mut job = job(vec![FitParameter::fitted(ParamKey::Permeability, 2.0, 0.1, 10.0)]);
        job.observed = ObservedSeries::default();
        let outcome = run_fit(&job, &CancelToken::new(), &mut |_| {});
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.curve.is_empty());
    }
}
