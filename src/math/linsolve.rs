//! Dense linear solves for the boundary-element system and the LM normal
//! equations.
//!
//! Both systems are small (a few dozen unknowns at most), so a direct LU
//! factorization is the first choice. When the pivots suggest the matrix is
//! close to singular we fall back to SVD, trying progressively looser
//! singular-value cutoffs.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// SVD cutoffs tried in order when LU is unusable.
const SVD_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Ratio of largest to smallest LU pivot magnitude.
///
/// Cheap stand-in for a condition number; infinite for a zero pivot.
pub fn pivot_ratio(u_diag: impl Iterator<Item = f64>) -> f64 {
    let (lo, hi) = u_diag.fold((f64::INFINITY, 0.0_f64), |(lo, hi), d| {
        let d = d.abs();
        (lo.min(d), hi.max(d))
    });
    if lo > 0.0 { hi / lo } else { f64::INFINITY }
}

/// Solve a square system, falling back to SVD above `condition_limit`.
///
/// Returns `None` only if every attempt produced a non-finite solution.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>, condition_limit: f64) -> Option<DVector<f64>> {
    let lu = a.clone().lu();
    let ratio = pivot_ratio(lu.u().diagonal().iter().copied());

    if ratio.is_finite() && ratio <= condition_limit {
        if let Some(x) = lu.solve(b) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    debug!(pivot_ratio = ratio, "LU rejected, falling back to SVD");
    solve_least_squares(a, b)
}

/// Least-squares solve via SVD; also handles non-square systems.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);
    for &tol in &SVD_TOLERANCES {
        if let Ok(x) = svd.solve(b, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lu_path_solves_well_conditioned_system() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let x = solve_dense(&a, &b, 1e12).unwrap();
        let r = &a * &x - &b;
        assert!(r.norm() < 1e-12);
    }

    #[test]
    fn singular_system_falls_back_to_minimum_norm() {
        // Rank one: x + y = 2 twice.
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let b = DVector::from_row_slice(&[2.0, 2.0]);
        let x = solve_dense(&a, &b, 1e12).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-10);
        assert!((x[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_fits_a_line() {
        // y = 2 + 3x on x = [0, 1, 2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let x = solve_least_squares(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-10);
        assert!((x[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn pivot_ratio_flags_zero_pivots() {
        assert_eq!(pivot_ratio([2.0, -4.0].into_iter()), 2.0);
        assert!(pivot_ratio([1.0, 0.0].into_iter()).is_infinite());
    }
}
