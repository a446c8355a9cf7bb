//! Boundary-element solve for the Laplace-space bottom-hole pressure.
//!
//! Unknowns are the flux density `q_j` of every fracture segment plus the
//! bottom-hole pressure `pw`. Each segment row enforces
//!
//! ```text
//! Σ_j q_j ∫_seg_j G(|x_i - s|) ds - pw = 0
//! ```
//!
//! at the segment midpoint (infinite-conductivity fractures), and the last
//! row fixes the total rate: `Σ_j ℓ_j q_j = 1 / z`.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::config::SolverSettings;
use crate::domain::BoundaryKind;
use crate::math::solve_dense;
use crate::models::ZoneModel;
use crate::solver::geometry::{Segment, build_segments};
use crate::solver::kernel::{Kernel, composite_coefficient};

/// Geometry and interface data that do not depend on `z`.
#[derive(Debug, Clone)]
pub struct BoundaryElementSolver<M> {
    media: M,
    boundary: BoundaryKind,
    segments: Vec<Segment>,
    mobility_ratio: f64,
    composite_radius_d: f64,
    outer_radius_d: f64,
    settings: SolverSettings,
}

/// Reservoir geometry in dimensionless units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReservoirGeometry {
    pub fracture_count: usize,
    pub fracture_half_length_d: f64,
    pub mobility_ratio: f64,
    pub composite_radius_d: f64,
    /// Ignored for an infinite boundary.
    pub outer_radius_d: f64,
}

impl<M: ZoneModel> BoundaryElementSolver<M> {
    pub fn new(media: M, boundary: BoundaryKind, geometry: ReservoirGeometry, settings: &SolverSettings) -> Self {
        let segments = build_segments(
            geometry.fracture_count,
            geometry.fracture_half_length_d,
            settings.segments_per_fracture,
        );
        Self {
            media,
            boundary,
            segments,
            mobility_ratio: geometry.mobility_ratio,
            composite_radius_d: geometry.composite_radius_d,
            outer_radius_d: geometry.outer_radius_d,
            settings: settings.clone(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Kernel for one Laplace variable.
    pub fn kernel(&self, z: f64) -> Kernel {
        let gamma1 = (z * self.media.inner_response(z)).sqrt();
        let gamma2 = (z * self.media.outer_response(z)).sqrt();
        let composite = composite_coefficient(
            self.boundary,
            gamma1,
            gamma2,
            self.mobility_ratio,
            self.composite_radius_d,
            self.outer_radius_d,
        );
        Kernel::new(gamma1, composite, self.composite_radius_d)
    }

    /// Assemble the `(n + 1)`-square system for one `z`.
    pub fn assemble(&self, kernel: &Kernel, z: f64) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.segments.len();
        let mut a = DMatrix::<f64>::zeros(n + 1, n + 1);
        let mut b = DVector::<f64>::zeros(n + 1);

        for (i, si) in self.segments.iter().enumerate() {
            let yi = si.midpoint();
            for (j, sj) in self.segments.iter().enumerate() {
                a[(i, j)] = if i == j {
                    kernel.self_influence(sj.length(), &self.settings)
                } else {
                    kernel.cross_influence(si.x - sj.x, yi, sj.y0, sj.y1, &self.settings)
                };
            }
            a[(i, n)] = -1.0;
        }
        for (j, sj) in self.segments.iter().enumerate() {
            a[(n, j)] = sj.length();
        }
        b[n] = 1.0 / z;
        (a, b)
    }

    /// Laplace-space bottom-hole pressure; 0 for an unusable `z` or system.
    pub fn laplace_pressure(&self, z: f64) -> f64 {
        if !(z.is_finite() && z > 0.0) || self.segments.is_empty() {
            return 0.0;
        }
        let kernel = self.kernel(z);
        if !(kernel.gamma1.is_finite() && kernel.gamma1 > 0.0) {
            debug!(z, gamma1 = kernel.gamma1, "Degenerate decay constant");
            return 0.0;
        }
        let (a, b) = self.assemble(&kernel, z);
        match solve_dense(&a, &b, self.settings.condition_limit) {
            Some(x) if x[self.segments.len()].is_finite() => x[self.segments.len()],
            _ => {
                warn!(z, unknowns = b.len(), "Boundary-element system could not be solved");
                0.0
            }
        }
    }
}
