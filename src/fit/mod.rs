//! Parameter estimation.
//!
//! Responsibilities:
//!
//! - log/linear step convention for derivatives and updates
//! - weighted log-ratio residuals
//! - the Levenberg–Marquardt loop (Jacobian columns in parallel)
//! - background sessions with cooperative cancellation

pub mod fitter;
pub mod residuals;
pub mod session;
pub mod steps;

pub use fitter::*;
pub use residuals::*;
pub use session::*;
pub use steps::*;
