//! Numerical building blocks: Bessel functions, quadrature, dense solves.

pub mod bessel;
pub mod linsolve;
pub mod quadrature;

pub use linsolve::*;
pub use quadrature::{Tolerance, integrate};
