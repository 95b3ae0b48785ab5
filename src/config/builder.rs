//! Builder API for engine configuration.

use crate::config::error::ConfigRejected;
use crate::config::settings::AlternationConfig;
use std::time::Duration;

/// Fluent builder for [`AlternationConfig`].
pub struct ConfigBuilder {
    config: AlternationConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AlternationConfig::default(),
        }
    }

    /// Fix the selection RNG seed (reproducible runs)
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set how often a blocked attempt re-checks preconditions
    pub fn recheck_interval(mut self, interval: Duration) -> Self {
        self.config.recheck_interval = Some(interval);
        self
    }

    /// Wake blocked attempts on source signals only
    pub fn without_recheck(mut self) -> Self {
        self.config.recheck_interval = None;
        self
    }

    /// Bound each blocking attempt
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    /// Bound the number of attempts in a repetition
    pub fn max_iterations(mut self, limit: usize) -> Self {
        self.config.max_iterations = Some(limit);
        self
    }

    pub fn record_history(mut self, enabled: bool) -> Self {
        self.config.record_history = enabled;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<AlternationConfig, ConfigRejected> {
        self.config.check()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
