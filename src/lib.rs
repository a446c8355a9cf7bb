//! `mfhw-pta` library crate: pressure-transient analysis for multi-fractured
//! horizontal wells in composite reservoirs.
//!
//! The binary (`pta`) is a thin wrapper around this library so that:
//!
//! - the solver and the fitter are testable without spawning processes
//! - a fit session can be driven by any front-end through its event channel
//!
//! Data flow: `models::preprocess` → `solver` (Laplace-space boundary elements,
//! wellbore storage/skin, Stehfest inversion) → `data::bourdet_derivative`;
//! `fit` wraps that forward model in a Levenberg–Marquardt loop.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod solver;
