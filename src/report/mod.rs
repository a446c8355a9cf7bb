//! Reporting utilities: fit diagnostics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{CurveResult, ObservedSeries};
use crate::fit::{channel_sse, mean_squared_error, residuals};

/// Per-channel misfit of a model curve against observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitDiagnostics {
    pub samples: usize,
    pub pressure_sse: f64,
    pub derivative_sse: f64,
    pub mse: f64,
}

/// Diagnostics of `curve` (evaluated at the observed times) against `observed`.
pub fn diagnose(observed: &ObservedSeries, curve: &CurveResult, weight: f64) -> FitDiagnostics {
    let r = residuals(observed, curve, weight);
    let (pressure_sse, derivative_sse) = channel_sse(&r);
    FitDiagnostics {
        samples: observed.len(),
        pressure_sse,
        derivative_sse,
        mse: mean_squared_error(pressure_sse + derivative_sse, observed.len()),
    }
}

/// `(min, max)` of the finite positive entries, if any.
pub fn positive_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
