//! Reservoir media and parameter preparation.
//!
//! Both are small pure functions so the solver and the fitter can share them.

pub mod medium;
pub mod preprocess;

pub use medium::*;
pub use preprocess::*;
