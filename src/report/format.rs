//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the solver and fitter stay free of presentation concerns
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{CurveResult, FitParameter, ModelVariant, ParameterSet};
use crate::fit::{FitOutcome, FitStatus};
use crate::report::{FitDiagnostics, positive_range};

/// The numbered variant catalogue (`pta variants`).
pub fn format_variant_catalogue() -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>3}  {:<14} {:<14} {:<18} {:<8}\n",
        "id", "inner", "outer", "boundary", "storage"
    ));
    out.push_str(&format!("{:-<3}  {:-<14} {:-<14} {:-<18} {:-<8}\n", "", "", "", "", ""));
    for (i, v) in ModelVariant::catalogue().iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<14} {:<14} {:<18} {:<8}\n",
            i + 1,
            v.inner.display_name(),
            v.outer.display_name(),
            v.boundary.display_name(),
            if v.storage_considered() { "yes" } else { "no" },
        ));
    }
    out
}

/// Header block of a forward run.
pub fn format_curve_summary(variant: &ModelVariant, params: &ParameterSet, curve: &CurveResult) -> String {
    let mut out = String::new();

    out.push_str("=== pta - Theoretical Curve ===\n");
    out.push_str(&format!("Model: {}\n", fmt_variant(variant)));
    out.push_str(&format!("Parameters: {}\n", fmt_param_set(params)));

    match (curve.time().first(), curve.time().last()) {
        (Some(t0), Some(t1)) => out.push_str(&format!("Points: n={} | t=[{t0:.3e}, {t1:.3e}] h\n", curve.len())),
        _ => out.push_str("Points: n=0\n"),
    }
    if let Some((lo, hi)) = positive_range(curve.pressure()) {
        out.push_str(&format!("Pressure: [{lo:.4e}, {hi:.4e}] MPa\n"));
    }
    if let Some((lo, hi)) = positive_range(curve.derivative()) {
        out.push_str(&format!("Derivative: [{lo:.4e}, {hi:.4e}] MPa\n"));
    }
    out.push('\n');

    out
}

/// Curve rows as a fixed-width table, thinned to at most `max_rows`.
///
/// The first and last rows are always shown.
pub fn format_curve_table(curve: &CurveResult, max_rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>14} {:>14} {:>14}\n", "time_h", "dp_mpa", "dp'_mpa"));
    out.push_str(&format!("{:-<14} {:-<14} {:-<14}\n", "", "", ""));

    let n = curve.len();
    if n == 0 || max_rows == 0 {
        return out;
    }
    let stride = if n <= max_rows { 1 } else { n.div_ceil(max_rows) };
    for (i, (t, p, d)) in curve.rows().enumerate() {
        if i % stride != 0 && i + 1 != n {
            continue;
        }
        out.push_str(&format!("{t:>14.4e} {p:>14.4e} {d:>14.4e}\n"));
    }
    out
}

/// One line per accepted iteration.
pub fn format_iteration(iteration: usize, mse: f64, parameters: &[FitParameter]) -> String {
    let free: Vec<String> = parameters
        .iter()
        .filter(|p| p.is_free())
        .map(|p| format!("{}={}", p.key.symbol(), fmt_value(p.value)))
        .collect();
    format!("iter {iteration:>3}  mse={mse:.4e}  {}", free.join(" "))
}

/// Final fit report: status, misfit, and the parameter table.
pub fn format_fit_summary(outcome: &FitOutcome, variant: &ModelVariant, diagnostics: &FitDiagnostics) -> String {
    let mut out = String::new();

    out.push_str("=== pta - Levenberg-Marquardt Fit ===\n");
    out.push_str(&format!("Model: {}\n", fmt_variant(variant)));
    out.push_str(&format!(
        "Status: {} after {} iteration(s)\n",
        outcome.status.display_name(),
        outcome.iterations
    ));
    if outcome.mse.is_finite() {
        out.push_str(&format!("MSE (sampled): {:.6e}\n", outcome.mse));
    }
    out.push_str(&format!(
        "Misfit (all {} points): pressure SSE={:.4e} derivative SSE={:.4e} MSE={:.4e}\n",
        diagnostics.samples, diagnostics.pressure_sse, diagnostics.derivative_sse, diagnostics.mse
    ));
    if outcome.status == FitStatus::Stalled {
        out.push_str("Note: no trial step improved the fit; try other starting values or bounds.\n");
    }

    out.push_str("\nParameters:\n");
    out.push_str(&format_parameter_table(&outcome.parameters));
    out.push('\n');

    out
}

fn format_parameter_table(parameters: &[FitParameter]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<7} {:<22} {:>12} {:>12} {:>12} {:<5}\n",
        "symbol", "name", "value", "min", "max", "fit"
    ));
    out.push_str(&format!(
        "{:-<7} {:-<22} {:-<12} {:-<12} {:-<12} {:-<5}\n",
        "", "", "", "", "", ""
    ));
    for p in parameters.iter().filter(|p| p.is_visible) {
        let (min, max) = if p.is_fit {
            (fmt_value(p.min), fmt_value(p.max))
        } else {
            (String::new(), String::new())
        };
        out.push_str(
            format!(
                "{:<7} {:<22} {:>12} {:>12} {:>12} {:<5}",
                p.key.symbol(),
                p.key.as_str(),
                fmt_value(p.value),
                min,
                max,
                if p.is_fit { "*" } else { "" },
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_variant(variant: &ModelVariant) -> String {
    match variant.to_id() {
        Some(id) => format!("#{id} {variant}"),
        None => variant.to_string(),
    }
}

fn fmt_param_set(params: &ParameterSet) -> String {
    if params.is_empty() {
        return "(defaults)".to_string();
    }
    let parts: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k.symbol(), fmt_value(v)))
        .collect();
    parts.join(" ")
}

fn fmt_value(v: f64) -> String {
    let a = v.abs();
    if v == 0.0 || (1e-3..1e4).contains(&a) {
        let s = format!("{v:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        format!("{v:.4e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamKey;

    #[test]
    fn catalogue_lists_every_variant() {
        let text = format_variant_catalogue();
        assert_eq!(text.lines().count(), 2 + 36);
        assert!(text.lines().nth(2).unwrap().contains("homogeneous"));
        assert!(text.contains("constant-pressure"));
    }

    #[test]
    fn curve_table_keeps_first_and_last_rows() {
        let time: Vec<f64> = (1..=10).map(f64::from).collect();
        let curve = CurveResult::from_parts(time.clone(), time.clone(), time).unwrap();
        let text = format_curve_table(&curve, 3);
        let rows: Vec<&str> = text.lines().skip(2).collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].trim_start().starts_with("1.0000e0"));
        assert!(rows[3].trim_start().starts_with("1.0000e1"));
        assert_eq!(format_curve_table(&CurveResult::empty(), 5).lines().count(), 2);
    }

    #[test]
    fn fit_summary_marks_fitted_parameters() {
        let outcome = FitOutcome {
            status: FitStatus::Converged,
            iterations: 3,
            mse: 1e-4,
            parameters: vec![
                FitParameter::fitted(ParamKey::Permeability, 5.0, 0.1, 100.0),
                FitParameter::fixed(ParamKey::Porosity, 0.05),
            ],
            curve: CurveResult::empty(),
        };
        let diagnostics = FitDiagnostics {
            samples: 0,
            pressure_sse: 0.0,
            derivative_sse: 0.0,
            mse: 0.0,
        };
        let variant = ModelVariant::from_id(1).unwrap();
        let text = format_fit_summary(&outcome, &variant, &diagnostics);
        assert!(text.contains("Status: converged after 3 iteration(s)"));
        assert!(text.contains("Model: #1 "));
        let k_row = text.lines().find(|l| l.starts_with("k ")).unwrap();
        assert!(k_row.ends_with('*'));
        let phi_row = text.lines().find(|l| l.starts_with("phi")).unwrap();
        assert!(!phi_row.contains('*'));
    }

    #[test]
    fn iteration_line_lists_free_parameters_only() {
        let params = vec![
            FitParameter::fitted(ParamKey::Storage, 0.2, 0.01, 1.0),
            FitParameter::fixed(ParamKey::Rate, 10.0),
        ];
        let line = format_iteration(2, 0.5, &params);
        assert_eq!(line, "iter   2  mse=5.0000e-1  C=0.2");
    }

    #[test]
    fn values_switch_to_scientific_outside_range() {
        assert_eq!(fmt_value(5.0), "5");
        assert_eq!(fmt_value(0.0), "0");
        assert_eq!(fmt_value(1.25e-5), "1.2500e-5");
    }
}
