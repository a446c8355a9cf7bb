//! Export curves to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{CurveResult, ObservedSeries};
use crate::error::AppError;

fn same_time(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
}

/// Write a curve (and optionally the matching observations) to CSV.
///
/// Observed columns are filled only on rows whose time matches the observed
/// sample at the same index, which is the case for a fit's final curve.
pub fn write_curve_csv(path: &Path, curve: &CurveResult, observed: Option<&ObservedSeries>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    let write_err = |e: std::io::Error| AppError::new(2, format!("Failed to write export CSV: {e}"));

    if observed.is_some() {
        writeln!(out, "time_h,pressure_mpa,derivative_mpa,observed_pressure_mpa,observed_derivative_mpa").map_err(write_err)?;
    } else {
        writeln!(out, "time_h,pressure_mpa,derivative_mpa").map_err(write_err)?;
    }

    for (i, (t, p, d)) in curve.rows().enumerate() {
        write!(out, "{t:.10e},{p:.10e},{d:.10e}").map_err(write_err)?;
        if let Some(obs) = observed {
            match obs.points().get(i) {
                Some(o) if same_time(o.time, t) => {
                    write!(out, ",{:.10e},{:.10e}", o.pressure, o.derivative).map_err(write_err)?
                }
                _ => write!(out, ",,").map_err(write_err)?,
            }
        }
        writeln!(out).map_err(write_err)?;
    }
    out.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObservedPoint;

    #[test]
    fn writes_header_and_rows() {
        let curve = CurveResult::from_parts(vec![1.0, 2.0], vec![0.5, 0.75], vec![0.1, 0.2]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        write_curve_csv(&path, &curve, None).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "time_h,pressure_mpa,derivative_mpa");
        let cols: Vec<f64> = lines[2].split(',').map(|c| c.parse().unwrap()).collect();
        assert_eq!(cols, vec![2.0, 0.75, 0.2]);
    }

    #[test]
    fn observed_columns_follow_matching_times() {
        let curve = CurveResult::from_parts(vec![1.0, 2.0], vec![0.5, 0.75], vec![0.1, 0.2]).unwrap();
        let observed = ObservedSeries::new(vec![ObservedPoint {
            time: 1.0,
            pressure: 0.6,
            derivative: 0.15,
        }]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.csv");
        write_curve_csv(&path, &curve, Some(&observed)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1].split(',').count(), 5);
        assert!(lines[1].ends_with("6.0000000000e-1,1.5000000000e-1"));
        assert!(lines[2].ends_with(",,"));
    }
}
