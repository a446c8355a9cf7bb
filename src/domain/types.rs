//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the solver, the fitter, and the CLI
//! - exported to JSON/CSV
//! - reloaded later as observed data for a fit

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::params::{ParamKey, ParameterSet};
use crate::error::AppError;

/// Flow medium of one reservoir zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MediumKind {
    Homogeneous,
    DualPorosity,
    /// Dual porosity with an interlayer crossflow term.
    Interlayer,
}

/// Outer boundary of the reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Infinite,
    Closed,
    ConstantPressure,
}

/// Whether wellbore storage and skin are part of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Considered,
    Ignored,
}

impl MediumKind {
    pub fn display_name(self) -> &'static str {
        match self {
            MediumKind::Homogeneous => "homogeneous",
            MediumKind::DualPorosity => "dual-porosity",
            MediumKind::Interlayer => "interlayer",
        }
    }
}

impl BoundaryKind {
    pub fn display_name(self) -> &'static str {
        match self {
            BoundaryKind::Infinite => "infinite",
            BoundaryKind::Closed => "closed",
            BoundaryKind::ConstantPressure => "constant-pressure",
        }
    }
}

/// Medium pairs covered by the numeric variant catalogue, in id order.
const CATALOGUE_MEDIA: [(MediumKind, MediumKind); 6] = [
    (MediumKind::Homogeneous, MediumKind::Homogeneous),
    (MediumKind::DualPorosity, MediumKind::Homogeneous),
    (MediumKind::Interlayer, MediumKind::Homogeneous),
    (MediumKind::Homogeneous, MediumKind::DualPorosity),
    (MediumKind::DualPorosity, MediumKind::DualPorosity),
    (MediumKind::Interlayer, MediumKind::DualPorosity),
];

const CATALOGUE_BOUNDARIES: [BoundaryKind; 3] = [
    BoundaryKind::Infinite,
    BoundaryKind::Closed,
    BoundaryKind::ConstantPressure,
];

/// Immutable model descriptor.
///
/// The solver accepts any combination; only 36 of them carry a numeric id
/// (see [`ModelVariant::from_id`]), which is how curve files and the CLI
/// refer to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelVariant {
    pub inner: MediumKind,
    pub outer: MediumKind,
    pub boundary: BoundaryKind,
    pub storage: StorageKind,
}

impl ModelVariant {
    pub const CATALOGUE_LEN: u8 = 36;

    pub fn new(
        inner: MediumKind,
        outer: MediumKind,
        boundary: BoundaryKind,
        storage: StorageKind,
    ) -> Self {
        Self {
            inner,
            outer,
            boundary,
            storage,
        }
    }

    /// Look up a catalogue id (1..=36).
    pub fn from_id(id: u8) -> Option<Self> {
        if id == 0 || id > Self::CATALOGUE_LEN {
            return None;
        }
        let idx = usize::from(id - 1);
        let storage = if idx % 2 == 0 {
            StorageKind::Considered
        } else {
            StorageKind::Ignored
        };
        let boundary = CATALOGUE_BOUNDARIES[(idx / 2) % 3];
        let (inner, outer) = CATALOGUE_MEDIA[idx / 6];
        Some(Self::new(inner, outer, boundary, storage))
    }

    /// Catalogue id, if this combination has one.
    pub fn to_id(self) -> Option<u8> {
        let media = CATALOGUE_MEDIA
            .iter()
            .position(|&(i, o)| i == self.inner && o == self.outer)?;
        let boundary = CATALOGUE_BOUNDARIES
            .iter()
            .position(|&b| b == self.boundary)?;
        let storage = match self.storage {
            StorageKind::Considered => 0,
            StorageKind::Ignored => 1,
        };
        u8::try_from(media * 6 + boundary * 2 + storage + 1).ok()
    }

    /// Resolve a catalogue id at the I/O boundary.
    pub fn lookup(id: u8) -> Result<Self, AppError> {
        Self::from_id(id).ok_or_else(|| {
            AppError::new(
                2,
                format!("Unknown model variant id {id} (expected 1..={}).", Self::CATALOGUE_LEN),
            )
        })
    }

    /// All catalogued variants in id order.
    pub fn catalogue() -> Vec<Self> {
        (1..=Self::CATALOGUE_LEN).filter_map(Self::from_id).collect()
    }

    pub fn storage_considered(self) -> bool {
        self.storage == StorageKind::Considered
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} composite, {} boundary, {}",
            self.inner.display_name(),
            self.outer.display_name(),
            self.boundary.display_name(),
            match self.storage {
                StorageKind::Considered => "with storage+skin",
                StorageKind::Ignored => "no storage",
            }
        )
    }
}

/// A tunable parameter as seen by the fitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    pub key: ParamKey,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// Increment used by interactive editors; the fitter ignores it.
    pub step: f64,
    pub is_fit: bool,
    pub is_visible: bool,
}

impl FitParameter {
    /// A fixed (not fitted) parameter.
    pub fn fixed(key: ParamKey, value: f64) -> Self {
        Self {
            key,
            value,
            min: value,
            max: value,
            step: 0.0,
            is_fit: false,
            is_visible: true,
        }
    }

    /// A fitted parameter bounded to `[min, max]`.
    pub fn fitted(key: ParamKey, value: f64, min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            key,
            value,
            min,
            max,
            step: (max - min).abs() / 100.0,
            is_fit: true,
            is_visible: true,
        }
    }

    /// Free for the optimizer: marked for fitting and not a derived quantity.
    pub fn is_free(&self) -> bool {
        self.is_fit && !self.key.is_derived()
    }

    pub fn clamp_value(&self, value: f64) -> f64 {
        if self.is_fit && self.min <= self.max {
            value.clamp(self.min, self.max)
        } else {
            value
        }
    }
}

/// One log-time region of the reduced fitting set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingInterval {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// How the observed series is reduced before fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingSpec {
    /// Log-uniform over the whole series, at most this many points.
    Budget(usize),
    /// Explicit log-time sub-intervals with their own point counts.
    Intervals(Vec<SamplingInterval>),
}

impl SamplingSpec {
    /// Upper bound on the number of returned points.
    pub fn point_budget(&self) -> usize {
        match self {
            SamplingSpec::Budget(n) => *n,
            SamplingSpec::Intervals(intervals) => intervals.iter().map(|i| i.count).sum(),
        }
    }
}

/// Model output: three equal-length sequences, time strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveData")]
pub struct CurveResult {
    time: Vec<f64>,
    pressure: Vec<f64>,
    derivative: Vec<f64>,
}

#[derive(Deserialize)]
struct CurveData {
    time: Vec<f64>,
    pressure: Vec<f64>,
    derivative: Vec<f64>,
}

impl TryFrom<CurveData> for CurveResult {
    type Error = String;

    fn try_from(value: CurveData) -> Result<Self, Self::Error> {
        CurveResult::from_parts(value.time, value.pressure, value.derivative)
    }
}

impl CurveResult {
    /// Validate and build a curve.
    pub fn from_parts(time: Vec<f64>, pressure: Vec<f64>, derivative: Vec<f64>) -> Result<Self, String> {
        if time.len() != pressure.len() || time.len() != derivative.len() {
            return Err(format!(
                "curve columns differ in length: time={}, pressure={}, derivative={}",
                time.len(),
                pressure.len(),
                derivative.len()
            ));
        }
        if time.windows(2).any(|w| !(w[1] > w[0])) {
            return Err("curve time axis must be strictly increasing".to_string());
        }
        Ok(Self {
            time,
            pressure,
            derivative,
        })
    }

    /// Build from columns the caller already knows to be consistent.
    pub(crate) fn from_columns(time: Vec<f64>, pressure: Vec<f64>, derivative: Vec<f64>) -> Self {
        debug_assert_eq!(time.len(), pressure.len());
        debug_assert_eq!(time.len(), derivative.len());
        Self {
            time,
            pressure,
            derivative,
        }
    }

    /// All-zero curve on the given (sanitized) time axis.
    pub fn zeros(time: Vec<f64>) -> Self {
        let n = time.len();
        Self::from_columns(time, vec![0.0; n], vec![0.0; n])
    }

    pub fn empty() -> Self {
        Self::from_columns(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn derivative(&self) -> &[f64] {
        &self.derivative
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Iterate `(time, pressure, derivative)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.time
            .iter()
            .zip(self.pressure.iter())
            .zip(self.derivative.iter())
            .map(|((&t, &p), &d)| (t, p, d))
    }
}

/// One observed sample in caller-normalized units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedPoint {
    pub time: f64,
    pub pressure: f64,
    pub derivative: f64,
}

/// Observed pressure/derivative series, sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedSeries {
    points: Vec<ObservedPoint>,
}

impl ObservedSeries {
    /// Sort by time and drop samples with a non-positive or non-finite time.
    ///
    /// Repeated timestamps keep their first sample, so the series lines up
    /// row for row with a model curve evaluated at [`Self::times`].
    pub fn new(mut points: Vec<ObservedPoint>) -> Self {
        points.retain(|p| p.time.is_finite() && p.time > 0.0);
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        points.dedup_by(|later, kept| later.time == kept.time);
        Self { points }
    }

    pub fn from_curve(curve: &CurveResult) -> Self {
        Self::new(
            curve
                .rows()
                .map(|(time, pressure, derivative)| ObservedPoint {
                    time,
                    pressure,
                    derivative,
                })
                .collect(),
        )
    }

    pub fn points(&self) -> &[ObservedPoint] {
        &self.points
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Replace the derivative column with a Bourdet estimate of the pressures.
    pub fn with_bourdet_derivative(mut self, window: f64) -> Self {
        let times = self.times();
        let pressures: Vec<f64> = self.points.iter().map(|p| p.pressure).collect();
        let derivative = crate::data::bourdet_derivative(&times, &pressures, window);
        for (p, d) in self.points.iter_mut().zip(derivative) {
            p.derivative = d;
        }
        self
    }
}

/// Portable curve file (`pta curve --export-curve`).
///
/// Also accepted as the observed series of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub variant: ModelVariant,
    /// Catalogue id, when the variant has one.
    pub variant_id: Option<u8>,
    pub parameters: ParameterSet,
    pub curve: CurveResult,
}

impl CurveFile {
    pub fn new(variant: ModelVariant, parameters: ParameterSet, curve: CurveResult) -> Self {
        Self {
            tool: "pta".to_string(),
            generated_at: Utc::now(),
            variant,
            variant_id: variant.to_id(),
            parameters,
            curve,
        }
    }

    pub fn to_observed(&self) -> ObservedSeries {
        ObservedSeries::from_curve(&self.curve)
    }
}
