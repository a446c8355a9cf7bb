//! Log-ratio residuals between observations and a model curve.
//!
//! Two residuals per sample:
//!
//! ```text
//! w       · (ln p_obs - ln p_model)
//! (1 - w) · (ln d_obs - ln d_model)
//! ```
//!
//! A residual is zero whenever either side is non-positive.

use crate::domain::{CurveResult, ObservedSeries};

fn log_ratio(obs: f64, model: f64) -> f64 {
    if obs > 0.0 && model > 0.0 && obs.is_finite() && model.is_finite() {
        obs.ln() - model.ln()
    } else {
        0.0
    }
}

/// Interleaved pressure/derivative residuals, `2 · n` long.
///
/// The model curve must have been evaluated at the observed times; samples
/// the model lacks contribute zero.
pub fn residuals(observed: &ObservedSeries, model: &CurveResult, weight: f64) -> Vec<f64> {
    let w = weight.clamp(0.0, 1.0);
    let mut out = Vec::with_capacity(2 * observed.len());
    for (i, obs) in observed.points().iter().enumerate() {
        let (mp, md) = match (model.pressure().get(i), model.derivative().get(i)) {
            (Some(&p), Some(&d)) => (p, d),
            _ => (0.0, 0.0),
        };
        out.push(w * log_ratio(obs.pressure, mp));
        out.push((1.0 - w) * log_ratio(obs.derivative, md));
    }
    out
}

pub fn sum_of_squares(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// `(pressure SSE, derivative SSE)` of an interleaved residual vector.
pub fn channel_sse(residuals: &[f64]) -> (f64, f64) {
    residuals.chunks(2).fold((0.0, 0.0), |(p, d), pair| {
        let rp = pair[0];
        let rd = pair.get(1).copied().unwrap_or(0.0);
        (p + rp * rp, d + rd * rd)
    })
}

/// Mean squared error per sample; 0 for an empty series.
pub fn mean_squared_error(sse: f64, samples: usize) -> f64 {
    if samples == 0 { 0.0 } else { sse / samples as f64 }
}
