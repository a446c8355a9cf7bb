//! Wellbore storage and skin in Laplace space.

const DENOMINATOR_FLOOR: f64 = 1e-300;

/// `(z·pf + S) / (z + cD·z²·(z·pf + S))`.
///
/// A vanishing denominator yields `pf` unchanged rather than infinity.
pub fn apply_storage_skin(z: f64, pf: f64, storage_d: f64, skin: f64) -> f64 {
    let inner = z * pf + skin;
    let den = z + storage_d * z * z * inner;
    if !den.is_finite() || den.abs() < DENOMINATOR_FLOOR {
        return pf;
    }
    inner / den
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_storage_no_skin_is_identity() {
        for (z, pf) in [(0.5, 2.0), (10.0, 0.03), (1e-4, 900.0)] {
            let out = apply_storage_skin(z, pf, 0.0, 0.0);
            assert!((out - pf).abs() < 1e-12 * pf);
        }
    }

    #[test]
    fn skin_adds_a_constant_pressure_drop() {
        // With cD = 0 the transform is pf + S / z.
        let out = apply_storage_skin(2.0, 1.0, 0.0, 3.0);
        assert!((out - 2.5).abs() < 1e-15);
    }

    #[test]
    fn storage_dominates_at_early_time() {
        // Large z: pwD -> 1 / (cD z²), pure storage.
        let z = 1e6;
        let cd = 10.0;
        let out = apply_storage_skin(z, 1e-4, cd, 0.0);
        let pure = 1.0 / (cd * z * z);
        assert!(((out - pure) / pure).abs() < 1e-2);
    }

    #[test]
    fn zero_denominator_is_guarded() {
        assert_eq!(apply_storage_skin(0.0, 1.5, 1.0, 0.0), 1.5);
    }
}
