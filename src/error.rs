//! Application-level error type.
//!
//! Numerical faults inside the solver and fitter never surface here: they are
//! absorbed into sentinel values (zero curves, "did not converge" outcomes).
//! `AppError` only covers the orchestration boundary: config, files, the CLI,
//! and fit-session lifecycle misuse.

use std::path::PathBuf;

/// Error returned by the CLI and I/O layers.
///
/// The exit code is what the `pta` binary returns to the shell:
/// - 2: invalid input, config, or I/O
/// - 3: empty data
/// - 4: numerical or internal failure
#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

/// Failure while loading an engine configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_maps_to_input_exit_code() {
        let err: AppError = ConfigError::Invalid("stehfest_n".to_string()).into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("stehfest_n"));
    }
}
