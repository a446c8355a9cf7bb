//! Log-time sampling of observed series.
//!
//! A fit evaluates the model once per sampled time and Jacobian column, so
//! long gauge records are reduced to a bounded, log-uniform subset first.

use crate::domain::{ObservedSeries, SamplingSpec};

/// `steps` log-spaced points between `min` and `max` (inclusive).
///
/// Returns an empty vector for an invalid range; a single step gives `[min]`.
pub fn log_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max >= min) || steps == 0 {
        return Vec::new();
    }
    if steps == 1 || max == min {
        return vec![min; steps.min(1)];
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);
    (0..steps).map(|i| (ln_min + step * i as f64).exp()).collect()
}

/// For each ascending target, the closest sample at or after the cursor.
///
/// `log_times` must be ascending; the cursor only moves forward, so each
/// source sample is consumed at most once per call.
fn pick_closest(log_times: &[f64], targets: &[f64], out: &mut Vec<usize>) {
    let n = log_times.len();
    let mut cursor = 0;
    for &target in targets {
        if cursor >= n {
            break;
        }
        let lt = target.ln();
        let mut best = cursor;
        while best + 1 < n && (log_times[best + 1] - lt).abs() <= (log_times[best] - lt).abs() {
            best += 1;
        }
        out.push(best);
        cursor = best + 1;
    }
}

/// Indices of the retained samples, in ascending time order.
///
/// `times` must be ascending. Non-positive or non-finite times are never
/// selected. Samples whose times differ by at most `epsilon` (relative) are
/// merged, keeping the first.
pub fn sample_indices(times: &[f64], spec: &SamplingSpec, epsilon: f64) -> Vec<usize> {
    let valid: Vec<usize> = (0..times.len())
        .filter(|&i| times[i].is_finite() && times[i] > 0.0)
        .collect();
    if valid.is_empty() {
        return Vec::new();
    }
    let log_times: Vec<f64> = valid.iter().map(|&i| times[i].ln()).collect();

    let mut picked = Vec::new();
    match spec {
        SamplingSpec::Budget(budget) => {
            if valid.len() <= *budget {
                picked.extend(0..valid.len());
            } else {
                let first = times[valid[0]];
                let last = times[valid[valid.len() - 1]];
                pick_closest(&log_times, &log_space(first, last, *budget), &mut picked);
            }
        }
        SamplingSpec::Intervals(intervals) => {
            for interval in intervals {
                let targets = if interval.count == 1 {
                    let mid = (interval.start * interval.end).sqrt();
                    if mid.is_finite() && mid > 0.0 { vec![mid] } else { Vec::new() }
                } else {
                    log_space(interval.start.min(interval.end), interval.end.max(interval.start), interval.count)
                };
                pick_closest(&log_times, &targets, &mut picked);
            }
        }
    }

    picked.sort_unstable();
    picked.dedup();

    let mut out: Vec<usize> = Vec::with_capacity(picked.len());
    for local in picked {
        let idx = valid[local];
        if let Some(&prev) = out.last() {
            let (a, b) = (times[prev], times[idx]);
            if (b - a).abs() <= epsilon * a.abs().max(b.abs()) {
                continue;
            }
        }
        out.push(idx);
    }
    out
}

/// Reduced copy of an observed series.
pub fn sample_observations(series: &ObservedSeries, spec: &SamplingSpec, epsilon: f64) -> ObservedSeries {
    let times = series.times();
    let points = series.points();
    ObservedSeries::new(
        sample_indices(&times, spec, epsilon)
            .into_iter()
            .map(|i| points[i])
            .collect(),
    )
}
