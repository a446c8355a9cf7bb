//! Engine configuration.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line (errors are fatal)
//! 2. `PTA_CONFIG` environment variable (errors fall back to defaults)
//! 3. Built-in defaults
//!
//! The resulting [`EngineConfig`] is passed explicitly down to the solver
//! and the fitter; nothing here is global.

mod settings;

pub use settings::*;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV: &str = "PTA_CONFIG";

/// Everything one analysis session needs besides the data itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub defaults: ReservoirDefaults,
    pub solver: SolverSettings,
    pub fitter: FitterSettings,
}

impl EngineConfig {
    /// Load from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config using the standard search order.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded engine config");
            return Ok(config);
        }

        if let Ok(raw) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(raw);
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded engine config from {CONFIG_ENV}");
                    return Ok(config);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load {CONFIG_ENV}, using defaults");
                }
            }
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()?;
        self.fitter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [solver]
            stehfest_n = 12

            [defaults]
            porosity = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.solver.stehfest_n, 12);
        assert_eq!(cfg.solver.segments_per_fracture, 6);
        assert_eq!(cfg.defaults.porosity, 0.2);
        assert_eq!(cfg.fitter.max_iterations, 50);
    }

    #[test]
    fn sampling_intervals_parse_from_toml() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [fitter.sampling]
            intervals = [
                { start = 0.01, end = 1.0, count = 30 },
                { start = 1.0, end = 100.0, count = 50 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fitter.sampling.point_budget(), 80);
    }

    #[test]
    fn load_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[solver]\nsegments_per_fracture = 0").unwrap();
        let err = EngineConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_from_file_rejects_empty_sampling() {
        for body in [
            "[fitter]\nsampling = { budget = 0 }",
            "[fitter.sampling]\nintervals = [{ start = 0.01, end = 1.0, count = 0 }]",
        ] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "{body}").unwrap();
            let err = EngineConfig::load_from_file(file.path()).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{body}: {err}");
        }
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = EngineConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
