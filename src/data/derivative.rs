//! Bourdet log-time derivative `dΔp / d ln t`.

/// Slope between two samples in log time; `None` if their times coincide.
fn log_slope(times: &[f64], values: &[f64], a: usize, b: usize) -> Option<(f64, f64)> {
    let dx = (times[b].ln() - times[a].ln()).abs();
    if dx > 0.0 && dx.is_finite() {
        let dy = if b > a { values[b] - values[a] } else { values[a] - values[b] };
        Some((dy / dx, dx))
    } else {
        None
    }
}

/// Bourdet derivative of `values` with respect to `ln(times)`.
///
/// For each point the nearest left and right neighbours at least `window`
/// away in log time are used and their slopes weighted by the opposite
/// distance. With only one qualifying neighbour that slope is used; with none
/// the adjacent-point difference. The result is non-negative and has the
/// length of the shorter input. Times must be positive and ascending.
pub fn bourdet_derivative(times: &[f64], values: &[f64], window: f64) -> Vec<f64> {
    let n = times.len().min(values.len());
    if n < 2 {
        return vec![0.0; n];
    }
    let window = window.max(0.0);
    let lx: Vec<f64> = times[..n].iter().map(|t| t.ln()).collect();

    (0..n)
        .map(|i| {
            let left = (0..i)
                .rev()
                .find(|&j| lx[i] - lx[j] >= window && lx[i] > lx[j])
                .and_then(|j| log_slope(times, values, j, i));
            let right = (i + 1..n)
                .find(|&k| lx[k] - lx[i] >= window && lx[k] > lx[i])
                .and_then(|k| log_slope(times, values, i, k));

            let d = match (left, right) {
                (Some((ml, dl)), Some((mr, dr))) => (ml * dr + mr * dl) / (dl + dr),
                (Some((m, _)), None) | (None, Some((m, _))) => m,
                (None, None) => {
                    let (a, b) = if i + 1 < n { (i, i + 1) } else { (i - 1, i) };
                    log_slope(times, values, a, b).map_or(0.0, |(m, _)| m)
                }
            };
            if d.is_finite() { d.abs() } else { 0.0 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::log_space;

    #[test]
    fn semilog_line_has_constant_derivative() {
        let t = log_space(0.01, 100.0, 41);
        let p: Vec<f64> = t.iter().map(|t| 2.5 * t.ln() + 7.0).collect();
        for (i, d) in bourdet_derivative(&t, &p, 0.0).into_iter().enumerate() {
            assert!((d - 2.5).abs() < 1e-9, "i={i}, d={d}");
        }
    }

    #[test]
    fn power_law_reproduces_log_log_slope() {
        // p = t^k  =>  dp/dln t = k p
        let t = log_space(1e-2, 1e2, 81);
        for k in [0.25, 0.5, 1.0] {
            let p: Vec<f64> = t.iter().map(|t| t.powf(k)).collect();
            let d = bourdet_derivative(&t, &p, 0.0);
            for i in 5..t.len() - 5 {
                let ratio = d[i] / p[i];
                assert!((ratio - k).abs() < 5e-3 * k.max(1.0), "k={k}, i={i}, ratio={ratio}");
            }
        }
    }

    #[test]
    fn window_skips_close_neighbours() {
        let t = [1.0, 1.5, 10.0, 10.1, 100.0];
        let p = [0.0, 5.0, 1.0, 9.0, 2.0];
        // With a one-decade window point 2 pairs with points 0 and 4, so the
        // noisy near neighbours are ignored.
        let d = bourdet_derivative(&t, &p, 10.0_f64.ln() * 0.99);
        let expected = 1.0 / 10.0_f64.ln();
        assert!((d[2] - expected).abs() < 1e-12, "d={}", d[2]);
    }

    #[test]
    fn result_is_never_negative() {
        let t = [1.0, 2.0, 4.0, 8.0];
        let p = [4.0, 3.0, 2.0, 1.0];
        assert!(bourdet_derivative(&t, &p, 0.0).iter().all(|d| *d >= 0.0));
    }

    #[test]
    fn short_inputs() {
        assert!(bourdet_derivative(&[], &[], 0.0).is_empty());
        assert_eq!(bourdet_derivative(&[1.0], &[3.0], 0.0), vec![0.0]);
        assert_eq!(bourdet_derivative(&[1.0, 1.0], &[3.0, 4.0], 0.0), vec![0.0, 0.0]);
    }

    #[test]
    fn oversized_window_falls_back_to_adjacent_difference() {
        let t = [1.0, 2.0, 4.0];
        let p = [0.0, 1.0, 3.0];
        let d = bourdet_derivative(&t, &p, 100.0);
        assert!((d[0] - 1.0 / 2.0_f64.ln()).abs() < 1e-12);
        assert!((d[2] - 2.0 / 2.0_f64.ln()).abs() < 1e-12);
    }
}
