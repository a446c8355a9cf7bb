//! Gaver–Stehfest numerical Laplace inversion.
//!
//! ```text
//! f(t) ≈ (ln 2 / t) · Σ_{i=1..N} V_i · F(i · ln 2 / t)
//! ```
//!
//! The weights depend only on `N`, so one inverter is built per solver call
//! and reused for every time point. Time points are independent and are
//! evaluated in parallel.

use std::f64::consts::LN_2;

use rayon::prelude::*;

/// Smallest and largest supported term counts.
pub const MIN_TERMS: usize = 4;
pub const MAX_TERMS: usize = 18;

/// Inverter with precomputed Stehfest weights.
#[derive(Debug, Clone, PartialEq)]
pub struct StehfestInverter {
    coefficients: Vec<f64>,
}

fn factorials(n: usize) -> Vec<f64> {
    let mut out = vec![1.0; n + 1];
    for i in 1..=n {
        out[i] = out[i - 1] * i as f64;
    }
    out
}

impl StehfestInverter {
    /// Weights for `n` terms, snapped to an even value in `4..=18`.
    pub fn new(n: usize) -> Self {
        let n = n.clamp(MIN_TERMS, MAX_TERMS);
        let n = n + n % 2;
        let half = n / 2;
        let fact = factorials(n);

        let coefficients = (1..=n)
            .map(|i| {
                let lo = (i + 1) / 2;
                let hi = i.min(half);
                let sum: f64 = (lo..=hi)
                    .map(|k| {
                        (k as f64).powi(half as i32) * fact[2 * k]
                            / (fact[half - k] * fact[k] * fact[k - 1] * fact[i - k] * fact[2 * k - i])
                    })
                    .sum();
                if (i + half) % 2 == 0 { sum } else { -sum }
            })
            .collect();
        Self { coefficients }
    }

    pub fn terms(&self) -> usize {
        self.coefficients.len()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Invert `laplace` at a single time `t > 0`.
    ///
    /// Non-finite Laplace values contribute zero.
    pub fn invert_at<F>(&self, laplace: &F, t: f64) -> f64
    where
        F: Fn(f64) -> f64,
    {
        if !(t.is_finite() && t > 0.0) {
            return 0.0;
        }
        let a = LN_2 / t;
        let sum: f64 = self
            .coefficients
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let f = laplace((i + 1) as f64 * a);
                if f.is_finite() { v * f } else { 0.0 }
            })
            .sum();
        a * sum
    }

    /// Invert at every time point, in parallel.
    pub fn invert<F>(&self, laplace: F, times: &[f64]) -> Vec<f64>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        times.par_iter().map(|&t| self.invert_at(&laplace, t)).collect()
    }
}

/// Stress-sensitive pressure: `-ln(1 - γ p) / γ`.
///
/// The log argument is floored so large pressures saturate instead of
/// producing NaN.
pub fn stress_sensitive_pressure(pressure: f64, modulus: f64) -> f64 {
    if modulus == 0.0 || !modulus.is_finite() {
        return pressure;
    }
    let arg = (1.0 - modulus * pressure).max(1e-12);
    -arg.ln() / modulus
}
