//! Raw parameters → the complete dimensionless set the solver reads.
//!
//! Missing or non-finite inputs are replaced from [`ReservoirDefaults`]; this
//! step never fails.

use tracing::warn;

use crate::config::ReservoirDefaults;
use crate::domain::{BoundaryKind, ModelVariant, ParamKey, ParameterSet};

/// Storage conversion constant for field-SI units.
pub const STORAGE_CONSTANT: f64 = 0.159;

/// Fill defaults and derive `LfD`, `cD`, `rmD`, `reD` (and `M12` if absent).
pub fn preprocess(
    variant: &ModelVariant,
    raw: &ParameterSet,
    defaults: &ReservoirDefaults,
) -> ParameterSet {
    let mut out = raw.clone();
    let mut fill = |key: ParamKey, value: f64| {
        let v = raw.get_or(key, value);
        out.set(key, v);
        v
    };

    let phi = fill(ParamKey::Porosity, defaults.porosity);
    let h = fill(ParamKey::Thickness, defaults.thickness);
    fill(ParamKey::Viscosity, defaults.viscosity);
    fill(ParamKey::VolumeFactor, defaults.volume_factor);
    let ct = fill(ParamKey::Compressibility, defaults.compressibility);
    fill(ParamKey::Rate, defaults.rate);
    fill(ParamKey::WellRadius, defaults.well_radius);
    let k = fill(ParamKey::Permeability, defaults.permeability);
    let l = fill(ParamKey::WellLength, defaults.well_length);
    let lf = fill(ParamKey::FractureHalfLength, defaults.fracture_half_length);
    let nf = fill(ParamKey::FractureCount, defaults.fracture_count);
    let skin = fill(ParamKey::Skin, defaults.skin);
    let storage = fill(ParamKey::Storage, defaults.storage);
    fill(ParamKey::Omega1, defaults.omega);
    fill(ParamKey::Omega2, defaults.omega);
    fill(ParamKey::Lambda1, defaults.lambda);
    fill(ParamKey::Lambda2, defaults.lambda);
    fill(ParamKey::DiffusivityRatio, defaults.diffusivity_ratio);
    fill(ParamKey::PermeabilityModulus, defaults.permeability_modulus);
    let rm = fill(ParamKey::CompositeRadius, defaults.composite_radius_factor * l);

    let mobility = match raw.get(ParamKey::MobilityRatio).filter(|v| v.is_finite()) {
        Some(m) => m,
        None => match raw.get(ParamKey::OuterPermeability) {
            Some(k2) if k2.is_finite() && k2 > 0.0 => k / k2,
            _ => defaults.mobility_ratio,
        },
    };
    out.set(ParamKey::MobilityRatio, mobility);

    out.set(ParamKey::FractureCount, nf.round().max(1.0));

    if variant.boundary != BoundaryKind::Infinite {
        let mut re = raw.get_or(ParamKey::OuterRadius, defaults.outer_radius_factor * rm);
        if re <= rm {
            let fixed = rm * defaults.outer_radius_factor.max(1.01);
            warn!(outer_radius = re, composite_radius = rm, using = fixed, "Outer radius inside composite radius");
            re = fixed;
        }
        out.set(ParamKey::OuterRadius, re);
        out.set(ParamKey::OuterRadiusD, re / l);
    } else {
        out.remove(ParamKey::OuterRadiusD);
    }

    out.set(ParamKey::FractureLengthD, lf / l);
    out.set(ParamKey::CompositeRadiusD, rm / l);

    if variant.storage_considered() {
        out.set(ParamKey::StorageD, STORAGE_CONSTANT * storage / (phi * h * ct * l * l));
        out.set(ParamKey::Skin, skin);
    } else {
        out.set(ParamKey::StorageD, 0.0);
        out.set(ParamKey::Skin, 0.0);
    }

    out
}
