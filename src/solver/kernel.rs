//! Laplace-space point-source kernel of the inner zone.
//!
//! For a line source in the inner zone the pressure kernel is
//!
//! ```text
//! G(r) = K0(γ1 r) + Ã · I0s(γ1 r) · exp(min(γ1 r - 2 γ1 rmD, 0))
//! ```
//!
//! where `Ã` couples the inner zone to the outer zone (and through it to the
//! outer boundary). Everything is written with exponentially scaled Bessel
//! functions so large `γ` never overflows.

use crate::config::SolverSettings;
use crate::domain::BoundaryKind;
use crate::math::bessel::{EULER_GAMMA, i0s, i1s, k0, k0s, k1s};
use crate::math::{Tolerance, integrate};

/// Scaled outer-boundary term `β̃` at `c = γ2 · reD`.
///
/// The outer-zone solution is `K0(γ2 r) + β I0(γ2 r)` with
/// `β = β̃ · e^{-2c}`. Zero for an infinite reservoir, positive for a
/// no-flow boundary and negative for constant pressure.
pub fn boundary_correction(kind: BoundaryKind, gamma2: f64, outer_radius_d: f64) -> f64 {
    let c = gamma2 * outer_radius_d;
    if !(c.is_finite() && c > 0.0) {
        return 0.0;
    }
    match kind {
        BoundaryKind::Infinite => 0.0,
        BoundaryKind::Closed => k1s(c) / i1s(c),
        BoundaryKind::ConstantPressure => -k0s(c) / i0s(c),
    }
}

/// Interface coefficient `Ã` from pressure and flux continuity at `rmD`.
///
/// Flux continuity is weighted by the mobility ratio `M12`. Returns 0 for
/// a degenerate interface instead of propagating NaN.
pub fn composite_coefficient(
    kind: BoundaryKind,
    gamma1: f64,
    gamma2: f64,
    mobility_ratio: f64,
    composite_radius_d: f64,
    outer_radius_d: f64,
) -> f64 {
    let beta = boundary_correction(kind, gamma2, outer_radius_d);
    let a = gamma1 * composite_radius_d;
    let b = gamma2 * composite_radius_d;
    let c = gamma2 * outer_radius_d;
    let e = if kind == BoundaryKind::Infinite {
        0.0
    } else {
        (2.0 * (b - c)).exp()
    };

    let p = k0s(b) + beta * i0s(b) * e;
    let q = -k1s(b) + beta * i1s(b) * e;
    let num = gamma2 * q * k0s(a) + mobility_ratio * gamma1 * k1s(a) * p;
    let den = mobility_ratio * gamma1 * i1s(a) * p - gamma2 * q * i0s(a);
    let coeff = num / den;
    if coeff.is_finite() { coeff } else { 0.0 }
}

/// The kernel for one Laplace variable.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub gamma1: f64,
    pub composite: f64,
    pub composite_radius_d: f64,
}

impl Kernel {
    pub fn new(gamma1: f64, composite: f64, composite_radius_d: f64) -> Self {
        Self {
            gamma1,
            composite,
            composite_radius_d,
        }
    }

    /// Beyond this distance the kernel is numerically negligible.
    pub fn effective_radius(&self, cutoff_factor: f64) -> f64 {
        cutoff_factor / self.gamma1
    }

    fn composite_term(&self, r: f64) -> f64 {
        if self.composite == 0.0 {
            return 0.0;
        }
        let x = self.gamma1 * r;
        let expo = (x - 2.0 * self.gamma1 * self.composite_radius_d).min(0.0);
        self.composite * i0s(x) * expo.exp()
    }

    /// `G(r)`.
    pub fn eval(&self, r: f64) -> f64 {
        k0(self.gamma1 * r) + self.composite_term(r)
    }

    /// `G(s) + ln(γ1 s)`, continuous at `s = 0`.
    fn regular_part(&self, s: f64) -> f64 {
        if s <= 0.0 {
            return std::f64::consts::LN_2 - EULER_GAMMA + self.composite_term(0.0);
        }
        self.eval(s) + (self.gamma1 * s).ln()
    }

    /// `∫ G(|s|) ds` over a segment centred on the collocation point.
    pub fn self_influence(&self, seg_len: f64, settings: &SolverSettings) -> f64 {
        let r_eff = self.effective_radius(settings.cutoff_factor);
        let h = (0.5 * seg_len).min(r_eff);
        if !(h > 0.0) {
            return 0.0;
        }
        // -∫_0^h ln(γ1 s) ds in closed form; the rest is smooth.
        let log_part = h * (1.0 - (self.gamma1 * h).ln());
        let tol = Tolerance::new(1e-14 * h, settings.self_tolerance, settings.max_quadrature_depth);
        let smooth = integrate(|s| self.regular_part(s), 0.0, h, tol);
        2.0 * (log_part + smooth)
    }

    /// `∫ G(√(dx² + (yi - s)²)) ds` for `s ∈ [y0, y1]`.
    ///
    /// The interval is clipped to the effective radius; pairs entirely
    /// outside it contribute nothing.
    pub fn cross_influence(&self, dx: f64, yi: f64, y0: f64, y1: f64, settings: &SolverSettings) -> f64 {
        let r_eff = self.effective_radius(settings.cutoff_factor);
        let dx = dx.abs();
        if dx >= r_eff {
            return 0.0;
        }
        let reach = (r_eff * r_eff - dx * dx).sqrt();
        let lo = y0.max(yi - reach);
        let hi = y1.min(yi + reach);
        if hi <= lo {
            return 0.0;
        }
        let seg_len = y1 - y0;
        let gap = (lo - yi).max(yi - hi).max(0.0);
        let dmin = dx.hypot(gap);
        let tol = Tolerance::new(
            1e-14 * seg_len,
            settings.cross_tolerance * (1.0 + dmin / seg_len),
            settings.max_quadrature_depth,
        );
        integrate(|s| self.eval(dx.hypot(yi - s)), lo, hi, tol)
    }
}
