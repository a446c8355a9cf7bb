//! Per-zone transfer functions `fs(z)`.
//!
//! The solver only ever sees `z · fs(z)` through the decay constants
//! `γ = √(z · fs)`, so the medium type of each zone is a pluggable detail:
//!
//! - Homogeneous: `1`
//! - DualPorosity: `(ω(1-ω)z + λ) / ((1-ω)z + λ)`
//! - Interlayer: `z · DualPorosity(z)`
//!
//! The outer zone is evaluated at `z · η12` and rescaled by `η12`.

use crate::domain::{MediumKind, ModelVariant, ParamKey, ParameterSet};

const TINY: f64 = 1e-300;

/// Transfer function of one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediumResponse {
    pub kind: MediumKind,
    pub omega: f64,
    pub lambda: f64,
}

impl MediumResponse {
    pub fn new(kind: MediumKind, omega: f64, lambda: f64) -> Self {
        Self { kind, omega, lambda }
    }

    pub fn homogeneous() -> Self {
        Self::new(MediumKind::Homogeneous, 1.0, 0.0)
    }

    /// `fs(z)` for this medium.
    pub fn transfer(&self, z: f64) -> f64 {
        match self.kind {
            MediumKind::Homogeneous => 1.0,
            MediumKind::DualPorosity => self.dual_porosity(z),
            MediumKind::Interlayer => z * self.dual_porosity(z),
        }
    }

    fn dual_porosity(&self, z: f64) -> f64 {
        let w = self.omega;
        let den = (1.0 - w) * z + self.lambda;
        if den.abs() < TINY {
            // ω = 1 and λ = 0 degenerate to a single-porosity medium.
            return 1.0;
        }
        (w * (1.0 - w) * z + self.lambda) / den
    }
}

/// What the boundary-element solver needs from the two zones.
pub trait ZoneModel: Sync {
    /// `fs_inner(z)`.
    fn inner_response(&self, z: f64) -> f64;
    /// `fs_outer(z)`, already scaled by the diffusivity ratio.
    fn outer_response(&self, z: f64) -> f64;
}

/// Inner and outer media of a composite reservoir.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeMedia {
    pub inner: MediumResponse,
    pub outer: MediumResponse,
    pub diffusivity_ratio: f64,
}

impl CompositeMedia {
    /// Build from a variant and a preprocessed parameter set.
    pub fn from_params(variant: &ModelVariant, params: &ParameterSet) -> Self {
        Self {
            inner: MediumResponse::new(
                variant.inner,
                params.get_or(ParamKey::Omega1, 0.1),
                params.get_or(ParamKey::Lambda1, 1e-4),
            ),
            outer: MediumResponse::new(
                variant.outer,
                params.get_or(ParamKey::Omega2, 0.1),
                params.get_or(ParamKey::Lambda2, 1e-4),
            ),
            diffusivity_ratio: params.get_or(ParamKey::DiffusivityRatio, 1.0),
        }
    }
}

impl ZoneModel for CompositeMedia {
    fn inner_response(&self, z: f64) -> f64 {
        self.inner.transfer(z)
    }

    fn outer_response(&self, z: f64) -> f64 {
        let eta = self.diffusivity_ratio;
        eta * self.outer.transfer(z * eta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_outer_zone_returns_diffusivity_ratio() {
        let media = CompositeMedia {
            inner: MediumResponse::homogeneous(),
            outer: MediumResponse::homogeneous(),
            diffusivity_ratio: 3.5,
        };
        assert_eq!(media.inner_response(0.7), 1.0);
        assert_eq!(media.outer_response(0.7), 3.5);
    }

    #[test]
    fn dual_porosity_limits() {
        let m = MediumResponse::new(MediumKind::DualPorosity, 0.1, 1e-4);
        // Early time (large z): fracture storage only, fs -> ω.
        assert!((m.transfer(1e9) - 0.1).abs() < 1e-6);
        // Late time (small z): total system, fs -> 1.
        assert!((m.transfer(1e-12) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn interlayer_scales_dual_porosity_by_z() {
        let dp = MediumResponse::new(MediumKind::DualPorosity, 0.2, 1e-3);
        let il = MediumResponse::new(MediumKind::Interlayer, 0.2, 1e-3);
        for z in [1e-3, 0.5, 40.0] {
            assert!((il.transfer(z) - z * dp.transfer(z)).abs() < 1e-15);
        }
    }

    #[test]
    fn degenerate_dual_porosity_does_not_divide_by_zero() {
        let m = MediumResponse::new(MediumKind::DualPorosity, 1.0, 0.0);
        assert_eq!(m.transfer(2.0), 1.0);
    }
}
