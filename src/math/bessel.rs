//! Modified Bessel functions of order 0 and 1 for real positive arguments.
//!
//! The solver mostly needs exponentially scaled forms:
//!
//! - `k0s(x) = e^x · K0(x)`, `k1s(x) = e^x · K1(x)`
//! - `i0s(x) = e^-x · I0(x)`, `i1s(x) = e^-x · I1(x)`
//!
//! which stay O(1/√x) for large `x` where the plain functions over/underflow.
//!
//! Evaluation regimes:
//! - `x <= 2`: ascending series (K via the logarithmic series)
//! - `2 < x < 20`: trapezoidal rule on `∫ e^{-x(cosh t - 1)} cosh(νt) dt`,
//!   which converges geometrically for this analytic integrand
//! - `x >= 20` (K) / `x > 25` (I): Hankel asymptotic expansion
//!
//! Unscaled `K` returns 0 beyond [`K_UNDERFLOW_ARG`]; unscaled `I` saturates
//! to `f64::MAX` past the overflow point. Nothing here panics or returns NaN
//! for `x > 0`.

use std::f64::consts::PI;

/// Euler–Mascheroni constant.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Beyond this argument `K0`/`K1` are reported as exactly zero.
pub const K_UNDERFLOW_ARG: f64 = 700.0;

const SERIES_EPS: f64 = 1e-17;
const K_SERIES_MAX: f64 = 2.0;
const K_ASYMPTOTIC_MIN: f64 = 20.0;
const I_ASYMPTOTIC_MIN: f64 = 25.0;
const TINY: f64 = 1e-300;

/// Ascending series for `I_nu(x)`, `nu ∈ {0, 1}`.
fn i_series(nu: u32, x: f64) -> f64 {
    let q = 0.25 * x * x;
    let mut term = if nu == 0 { 1.0 } else { 0.5 * x };
    let mut sum = term;
    let nu = f64::from(nu);
    let mut k = 0.0;
    loop {
        k += 1.0;
        term *= q / (k * (k + nu));
        sum += term;
        if term <= SERIES_EPS * sum {
            return sum;
        }
    }
}

/// Hankel expansion shared by I (alternating) and K (same sign).
///
/// Returns `Σ c_k / x^k` truncated at the smallest term.
fn hankel_sum(nu: u32, x: f64, alternating: bool) -> f64 {
    let mu = 4.0 * f64::from(nu * nu);
    let mut term = 1.0_f64;
    let mut sum = 1.0;
    for k in 1..60 {
        let kf = f64::from(k);
        let odd = 2.0 * kf - 1.0;
        let mut next = term * (mu - odd * odd) / (kf * 8.0 * x);
        if alternating {
            next = -next;
        }
        if next.abs() >= term.abs() {
            break;
        }
        term = next;
        sum += term;
        if term.abs() < SERIES_EPS * sum.abs() {
            break;
        }
    }
    sum
}

fn k0_series(x: f64) -> f64 {
    let q = 0.25 * x * x;
    let log_term = (0.5 * x).ln() + EULER_GAMMA;
    let mut term = 1.0;
    let mut harmonic = 0.0;
    let mut i0 = 1.0;
    let mut tail = 0.0;
    let mut k = 0.0;
    loop {
        k += 1.0;
        term *= q / (k * k);
        harmonic += 1.0 / k;
        tail += term * harmonic;
        i0 += term;
        if term < SERIES_EPS {
            return -log_term * i0 + tail;
        }
    }
}

fn k1_series(x: f64) -> f64 {
    let q = 0.25 * x * x;
    // ψ(k+1) + ψ(k+2), starting at k = 0.
    let mut psi_a = -EULER_GAMMA;
    let mut psi_b = 1.0 - EULER_GAMMA;
    let mut term = 1.0;
    let mut sum = psi_a + psi_b;
    let mut k = 0.0;
    loop {
        k += 1.0;
        term *= q / (k * (k + 1.0));
        psi_a += 1.0 / k;
        psi_b += 1.0 / (k + 1.0);
        sum += term * (psi_a + psi_b);
        if term < SERIES_EPS {
            break;
        }
    }
    1.0 / x + (0.5 * x).ln() * i_series(1, x) - 0.25 * x * sum
}

/// Trapezoidal rule for `e^x K_nu(x) = ∫_0^∞ e^{-x(cosh t - 1)} cosh(νt) dt`.
fn k_scaled_integral(nu: u32, x: f64) -> f64 {
    let h = 0.25 * (2.0 / x).sqrt().min(1.0);
    let nu = f64::from(nu);
    let mut sum = 0.5;
    let mut t = 0.0;
    loop {
        t += h;
        let v = (-x * (t.cosh() - 1.0)).exp() * (nu * t).cosh();
        sum += v;
        if v < 1e-18 * sum {
            return sum * h;
        }
    }
}

/// `e^x · K0(x)`.
pub fn k0s(x: f64) -> f64 {
    let x = x.max(TINY);
    if x <= K_SERIES_MAX {
        k0_series(x) * x.exp()
    } else if x < K_ASYMPTOTIC_MIN {
        k_scaled_integral(0, x)
    } else {
        hankel_sum(0, x, false) * (PI / (2.0 * x)).sqrt()
    }
}

/// `e^x · K1(x)`.
pub fn k1s(x: f64) -> f64 {
    let x = x.max(TINY);
    if x <= K_SERIES_MAX {
        k1_series(x) * x.exp()
    } else if x < K_ASYMPTOTIC_MIN {
        k_scaled_integral(1, x)
    } else {
        hankel_sum(1, x, false) * (PI / (2.0 * x)).sqrt()
    }
}

/// `e^-x · I0(x)`.
pub fn i0s(x: f64) -> f64 {
    let x = x.abs();
    if x <= I_ASYMPTOTIC_MIN {
        i_series(0, x) * (-x).exp()
    } else {
        hankel_sum(0, x, true) / (2.0 * PI * x).sqrt()
    }
}

/// `e^-x · I1(x)` for `x >= 0`.
pub fn i1s(x: f64) -> f64 {
    let x = x.max(0.0);
    if x <= I_ASYMPTOTIC_MIN {
        i_series(1, x) * (-x).exp()
    } else {
        hankel_sum(1, x, true) / (2.0 * PI * x).sqrt()
    }
}

/// `K0(x)`; zero beyond [`K_UNDERFLOW_ARG`].
pub fn k0(x: f64) -> f64 {
    if x > K_UNDERFLOW_ARG {
        return 0.0;
    }
    let x = x.max(TINY);
    if x <= K_SERIES_MAX {
        k0_series(x)
    } else {
        k0s(x) * (-x).exp()
    }
}

/// `K1(x)`; zero beyond [`K_UNDERFLOW_ARG`].
pub fn k1(x: f64) -> f64 {
    if x > K_UNDERFLOW_ARG {
        return 0.0;
    }
    let x = x.max(TINY);
    if x <= K_SERIES_MAX {
        k1_series(x)
    } else {
        k1s(x) * (-x).exp()
    }
}

/// `I0(x)`, saturating instead of overflowing.
pub fn i0(x: f64) -> f64 {
    let x = x.abs();
    if x <= I_ASYMPTOTIC_MIN {
        return i_series(0, x);
    }
    saturate(i0s(x) * x.exp())
}

/// `I1(x)` for `x >= 0`, saturating instead of overflowing.
pub fn i1(x: f64) -> f64 {
    let x = x.max(0.0);
    if x <= I_ASYMPTOTIC_MIN {
        return i_series(1, x);
    }
    saturate(i1s(x) * x.exp())
}

fn saturate(v: f64) -> f64 {
    if v.is_finite() { v } else { f64::MAX }
}
