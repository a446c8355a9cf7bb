//! Data preparation shared by the solver, the fitter, and the CLI.
//!
//! - Bourdet log-derivative
//! - log-time sampling of long observed series
//! - synthetic observations generated from the model

pub mod derivative;
pub mod sampling;
pub mod synthetic;

pub use derivative::*;
pub use sampling::*;
pub use synthetic::*;
