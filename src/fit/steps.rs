//! Parameter step convention shared by the Jacobian and the update.
//!
//! Strictly positive parameters (other than skin and the fracture count) live
//! in log10 space: they are probed at `v · 10^±h` and updated as `v · 10^Δ`.
//! Everything else is probed at `v ± s` and updated as `v + Δ`.

use crate::config::FitterSettings;
use crate::domain::{FitParameter, ParamKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Log,
    Linear,
}

/// Probe and update rules for the free parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepConvention {
    pub log_step: f64,
    pub linear_step: f64,
}

impl StepConvention {
    pub fn from_settings(settings: &FitterSettings) -> Self {
        Self {
            log_step: settings.log_step,
            linear_step: settings.linear_step,
        }
    }

    pub fn kind(&self, key: ParamKey, value: f64) -> StepKind {
        if value > 0.0 && !key.is_linear() {
            StepKind::Log
        } else {
            StepKind::Linear
        }
    }

    /// `(plus, minus, spacing)` for a central difference at `value`.
    pub fn probe(&self, key: ParamKey, value: f64) -> (f64, f64, f64) {
        match self.kind(key, value) {
            StepKind::Log => {
                let f = 10f64.powf(self.log_step);
                (value * f, value / f, 2.0 * self.log_step)
            }
            StepKind::Linear => (value + self.linear_step, value - self.linear_step, 2.0 * self.linear_step),
        }
    }

    /// Distance between two (possibly clamped) difference points, measured in the
    /// step space of `value`.
    pub fn spacing(&self, key: ParamKey, value: f64, hi: f64, lo: f64) -> f64 {
        match self.kind(key, value) {
            StepKind::Log if hi > 0.0 && lo > 0.0 => (hi / lo).log10(),
            StepKind::Log => 0.0,
            StepKind::Linear => hi - lo,
        }
    }

    /// Apply a solved increment in the parameter's own space.
    pub fn apply(&self, key: ParamKey, value: f64, delta: f64) -> f64 {
        match self.kind(key, value) {
            StepKind::Log => value * 10f64.powf(delta),
            StepKind::Linear => value + delta,
        }
    }
}

/// Clamp to bounds; the fracture count is also rounded to a positive integer.
pub fn constrain(param: &FitParameter, value: f64) -> f64 {
    let v = param.clamp_value(value);
    if param.key == ParamKey::FractureCount {
        v.round().max(1.0)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convention() -> StepConvention {
        StepConvention::from_settings(&FitterSettings::default())
    }

    #[test]
    fn positive_parameters_step_in_log_space() {
        let c = convention();
        let (plus, minus, h) = c.probe(ParamKey::Permeability, 2.0);
        assert!((plus / 2.0 - 10f64.powf(0.01)).abs() < 1e-15);
        assert!((2.0 / minus - 10f64.powf(0.01)).abs() < 1e-15);
        assert_eq!(h, 0.02);
        assert!((c.apply(ParamKey::Permeability, 2.0, 1.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn skin_count_and_non_positive_values_step_linearly() {
        let c = convention();
        assert_eq!(c.kind(ParamKey::Skin, 3.0), StepKind::Linear);
        assert_eq!(c.kind(ParamKey::FractureCount, 4.0), StepKind::Linear);
        assert_eq!(c.kind(ParamKey::Omega1, 0.0), StepKind::Linear);
        let (plus, minus, h) = c.probe(ParamKey::Skin, -1.0);
        assert_eq!((plus, minus, h), (-1.0 + 1e-4, -1.0 - 1e-4, 2e-4));
        assert_eq!(c.apply(ParamKey::Skin, -1.0, 0.5), -0.5);
    }

    #[test]
    fn clamped_step_spacing_is_one_sided() {
        let c = convention();
        let p = FitParameter::fitted(ParamKey::Permeability, 10.0, 0.1, 10.0);
        let (plus, minus, full) = c.probe(p.key, p.value);
        let h = c.spacing(p.key, p.value, p.clamp_value(plus), p.clamp_value(minus));
        assert!((h - full / 2.0).abs() < 1e-12, "{h} vs {full}");

        let s = FitParameter::fitted(ParamKey::Skin, -2.0, -2.0, 5.0);
        let (plus, minus, full) = c.probe(s.key, s.value);
        let h = c.spacing(s.key, s.value, s.clamp_value(plus), s.clamp_value(minus));
        assert!((h - full / 2.0).abs() < 1e-12);

        assert_eq!(c.spacing(ParamKey::Permeability, 1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn fracture_count_is_rounded_and_clamped() {
        let p = FitParameter::fitted(ParamKey::FractureCount, 4.0, 1.0, 6.0);
        assert_eq!(constrain(&p, 4.4), 4.0);
        assert_eq!(constrain(&p, 9.0), 6.0);
        let loose = FitParameter::fitted(ParamKey::FractureCount, 4.0, -5.0, 6.0);
        assert_eq!(constrain(&loose, -3.0), 1.0);
    }
}
