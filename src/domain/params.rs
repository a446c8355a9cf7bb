//! Named model parameters.
//!
//! The solver works from a plain name→value map so callers (CLI flags, curve
//! files, a fit session) can carry partial parameter sets; the preprocessor
//! fills whatever is missing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every parameter name the engine understands.
///
/// The `*D` keys are derived by the preprocessor and never set by users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    Porosity,
    Thickness,
    Viscosity,
    VolumeFactor,
    Compressibility,
    Rate,
    WellRadius,
    Permeability,
    /// Outer-zone permeability; only used to derive `MobilityRatio` when absent.
    OuterPermeability,
    WellLength,
    FractureHalfLength,
    FractureCount,
    Skin,
    Storage,
    Omega1,
    Omega2,
    Lambda1,
    Lambda2,
    DiffusivityRatio,
    MobilityRatio,
    CompositeRadius,
    OuterRadius,
    /// Permeability modulus γ for stress-sensitive formations.
    PermeabilityModulus,
    FractureLengthD,
    StorageD,
    CompositeRadiusD,
    OuterRadiusD,
}

impl ParamKey {
    pub const ALL: [ParamKey; 27] = [
        ParamKey::Porosity,
        ParamKey::Thickness,
        ParamKey::Viscosity,
        ParamKey::VolumeFactor,
        ParamKey::Compressibility,
        ParamKey::Rate,
        ParamKey::WellRadius,
        ParamKey::Permeability,
        ParamKey::OuterPermeability,
        ParamKey::WellLength,
        ParamKey::FractureHalfLength,
        ParamKey::FractureCount,
        ParamKey::Skin,
        ParamKey::Storage,
        ParamKey::Omega1,
        ParamKey::Omega2,
        ParamKey::Lambda1,
        ParamKey::Lambda2,
        ParamKey::DiffusivityRatio,
        ParamKey::MobilityRatio,
        ParamKey::CompositeRadius,
        ParamKey::OuterRadius,
        ParamKey::PermeabilityModulus,
        ParamKey::FractureLengthD,
        ParamKey::StorageD,
        ParamKey::CompositeRadiusD,
        ParamKey::OuterRadiusD,
    ];

    /// Canonical snake_case name (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKey::Porosity => "porosity",
            ParamKey::Thickness => "thickness",
            ParamKey::Viscosity => "viscosity",
            ParamKey::VolumeFactor => "volume_factor",
            ParamKey::Compressibility => "compressibility",
            ParamKey::Rate => "rate",
            ParamKey::WellRadius => "well_radius",
            ParamKey::Permeability => "permeability",
            ParamKey::OuterPermeability => "outer_permeability",
            ParamKey::WellLength => "well_length",
            ParamKey::FractureHalfLength => "fracture_half_length",
            ParamKey::FractureCount => "fracture_count",
            ParamKey::Skin => "skin",
            ParamKey::Storage => "storage",
            ParamKey::Omega1 => "omega1",
            ParamKey::Omega2 => "omega2",
            ParamKey::Lambda1 => "lambda1",
            ParamKey::Lambda2 => "lambda2",
            ParamKey::DiffusivityRatio => "diffusivity_ratio",
            ParamKey::MobilityRatio => "mobility_ratio",
            ParamKey::CompositeRadius => "composite_radius",
            ParamKey::OuterRadius => "outer_radius",
            ParamKey::PermeabilityModulus => "permeability_modulus",
            ParamKey::FractureLengthD => "fracture_length_d",
            ParamKey::StorageD => "storage_d",
            ParamKey::CompositeRadiusD => "composite_radius_d",
            ParamKey::OuterRadiusD => "outer_radius_d",
        }
    }

    /// Short label for reports.
    pub fn symbol(self) -> &'static str {
        match self {
            ParamKey::Porosity => "phi",
            ParamKey::Thickness => "h",
            ParamKey::Viscosity => "mu",
            ParamKey::VolumeFactor => "B",
            ParamKey::Compressibility => "Ct",
            ParamKey::Rate => "q",
            ParamKey::WellRadius => "rw",
            ParamKey::Permeability => "k",
            ParamKey::OuterPermeability => "k2",
            ParamKey::WellLength => "L",
            ParamKey::FractureHalfLength => "Lf",
            ParamKey::FractureCount => "nf",
            ParamKey::Skin => "S",
            ParamKey::Storage => "C",
            ParamKey::Omega1 => "w1",
            ParamKey::Omega2 => "w2",
            ParamKey::Lambda1 => "lam1",
            ParamKey::Lambda2 => "lam2",
            ParamKey::DiffusivityRatio => "eta12",
            ParamKey::MobilityRatio => "M12",
            ParamKey::CompositeRadius => "rm",
            ParamKey::OuterRadius => "re",
            ParamKey::PermeabilityModulus => "gamma",
            ParamKey::FractureLengthD => "LfD",
            ParamKey::StorageD => "cD",
            ParamKey::CompositeRadiusD => "rmD",
            ParamKey::OuterRadiusD => "reD",
        }
    }

    /// Derived by the preprocessor; display-only and never fitted directly.
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            ParamKey::FractureLengthD
                | ParamKey::StorageD
                | ParamKey::CompositeRadiusD
                | ParamKey::OuterRadiusD
        )
    }

    /// Fitted and stepped in linear space even when positive.
    pub fn is_linear(self) -> bool {
        matches!(self, ParamKey::Skin | ParamKey::FractureCount)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ParamKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(needle) || k.symbol() == needle)
            .ok_or_else(|| format!("unknown parameter '{needle}'"))
    }
}

/// An ordered name→value parameter map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<ParamKey, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ParamKey, f64)>,
    {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: ParamKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: ParamKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    /// Value for `key`, or `default` when absent or non-finite.
    pub fn get_or(&self, key: ParamKey, default: f64) -> f64 {
        match self.get(key) {
            Some(v) if v.is_finite() => v,
            _ => default,
        }
    }

    pub fn set(&mut self, key: ParamKey, value: f64) {
        self.values.insert(key, value);
    }

    pub fn remove(&mut self, key: ParamKey) -> Option<f64> {
        self.values.remove(&key)
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Overlay `other` on top of `self` (values in `other` win).
    pub fn merged(&self, other: &ParameterSet) -> ParameterSet {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.set(k, v);
        }
        out
    }
}

/// Parse a `key=value` pair as used on the command line.
pub fn parse_param_pair(s: &str) -> Result<(ParamKey, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key: ParamKey = key.parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {key}: {e}"))?;
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_names_and_symbols() {
        for key in ParamKey::ALL {
            assert_eq!(key.as_str().parse::<ParamKey>().unwrap(), key);
            assert_eq!(key.symbol().parse::<ParamKey>().unwrap(), key);
        }
    }

    #[test]
    fn get_or_ignores_non_finite_values() {
        let set = ParameterSet::new().with(ParamKey::Skin, f64::NAN);
        assert_eq!(set.get_or(ParamKey::Skin, 1.5), 1.5);
        assert_eq!(set.get_or(ParamKey::Storage, 0.2), 0.2);
    }

    #[test]
    fn parameter_set_serializes_as_named_map() {
        let set = ParameterSet::new()
            .with(ParamKey::Permeability, 2.5)
            .with(ParamKey::FractureCount, 4.0);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"permeability":2.5,"fracture_count":4.0}"#);
        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn parses_cli_pairs() {
        assert_eq!(parse_param_pair("k=0.5").unwrap(), (ParamKey::Permeability, 0.5));
        assert_eq!(parse_param_pair("skin=-1.2").unwrap(), (ParamKey::Skin, -1.2));
        assert!(parse_param_pair("k").is_err());
        assert!(parse_param_pair("nope=1").is_err());
    }
}
