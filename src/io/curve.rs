//! Read/write curve JSON files.
//!
//! Curve JSON is the portable representation of a type curve:
//! - the model variant (descriptor and catalogue id)
//! - the raw parameters it was computed from
//! - the `(time, pressure, derivative)` columns
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::domain::CurveFile;
use crate::error::AppError;

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))
}

/// Read a curve JSON file.
///
/// The curve columns are validated on load (equal lengths, increasing time).
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid curve JSON '{}': {e}", path.display())))?;
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveResult, ModelVariant, ParamKey, ParameterSet};

    #[test]
    fn curve_file_survives_a_disk_round_trip() {
        let variant = ModelVariant::from_id(5).unwrap();
        let params = ParameterSet::new().with(ParamKey::Permeability, 3.0);
        let curve = CurveResult::from_parts(vec![0.1, 1.0], vec![0.2, 0.4], vec![0.1, 0.1]).unwrap();
        let file = CurveFile::new(variant, params, curve);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        write_curve_json(&path, &file).unwrap();
        let back = read_curve_json(&path).unwrap();
        assert_eq!(back, file);
        assert_eq!(back.variant_id, Some(5));
        assert_eq!(back.to_observed().len(), 2);
    }

    #[test]
    fn rejects_inconsistent_columns() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"tool":"pta","generated_at":"2024-01-01T00:00:00Z",
               "variant":{{"inner":"homogeneous","outer":"homogeneous","boundary":"infinite","storage":"ignored"}},
               "variant_id":2,"parameters":{{}},
               "curve":{{"time":[1.0,2.0],"pressure":[1.0],"derivative":[1.0,1.0]}}}}"#
        )
        .unwrap();
        let err = read_curve_json(tmp.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_curve_json(Path::new("/no/such/curve.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
