//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - the model descriptor (`ModelVariant` and its kind enums)
//! - named parameters (`ParamKey`, `ParameterSet`, `FitParameter`)
//! - curves and observations (`CurveResult`, `ObservedSeries`)
//! - sampling requests (`SamplingInterval`, `SamplingSpec`)

pub mod params;
pub mod types;

pub use params::*;
pub use types::*;
