//! Engine configuration and its validation.

use crate::config::builder::ConfigBuilder;
use crate::config::error::{ConfigError, ConfigRejected};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// How often a blocked alternation re-evaluates preconditions when no
/// source has signalled.
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Settings for an [`Alternation`](crate::engine::Alternation) engine.
///
/// Missing fields take their defaults when deserializing, so a partial JSON
/// document is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternationConfig {
    /// Seed for the selection RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Precondition re-check period while blocked. `None` waits for source
    /// signals only.
    pub recheck_interval: Option<Duration>,

    /// Upper bound on one blocking attempt. Expiry yields `Cancelled`.
    pub deadline: Option<Duration>,

    /// Upper bound on attempts per repetition.
    pub max_iterations: Option<usize>,

    /// Keep an attempt history in repetition reports.
    pub record_history: bool,
}

impl Default for AlternationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            recheck_interval: Some(DEFAULT_RECHECK_INTERVAL),
            deadline: None,
            max_iterations: None,
            record_history: true,
        }
    }
}

impl AlternationConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigRejected> {
        let config: Self = serde_json::from_str(json)
            .map_err(|error| ConfigError::Malformed(error.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Validate every setting, accumulating ALL problems.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigError>>> = Vec::new();

        if let Some(interval) = self.recheck_interval {
            checks.push(if interval.is_zero() {
                Validation::fail(ConfigError::ZeroRecheckInterval)
            } else {
                Validation::success(())
            });
        }

        if let Some(deadline) = self.deadline {
            checks.push(if deadline.is_zero() {
                Validation::fail(ConfigError::ZeroDeadline)
            } else {
                Validation::success(())
            });
        }

        if let Some(limit) = self.max_iterations {
            checks.push(if limit == 0 {
                Validation::fail(ConfigError::ZeroIterationLimit)
            } else {
                Validation::success(())
            });
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn check(&self) -> Result<(), ConfigRejected> {
        match self.validate() {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => Err(ConfigRejected {
                errors: errors.iter().cloned().collect(),
            }),
        }
    }
}
