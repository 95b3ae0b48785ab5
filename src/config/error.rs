//! Configuration errors.

use thiserror::Error;

/// A single problem with an [`AlternationConfig`](super::AlternationConfig).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("recheck interval must be non-zero")]
    ZeroRecheckInterval,

    #[error("deadline must be non-zero")]
    ZeroDeadline,

    #[error("iteration limit must be at least 1")]
    ZeroIterationLimit,

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Every problem found while validating a configuration.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("configuration rejected ({} problem(s)): {}", .errors.len(), render(.errors))]
pub struct ConfigRejected {
    pub errors: Vec<ConfigError>,
}

impl From<ConfigError> for ConfigRejected {
    fn from(error: ConfigError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

fn render(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
