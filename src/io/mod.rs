//! Input/output helpers.
//!
//! - curve JSON read/write (`curve`)
//! - CSV export of curves and observations (`export`)

pub mod curve;
pub mod export;

pub use curve::*;
pub use export::*;
