//! Engine configuration.
//!
//! Configuration is validated with Stillwater's `Validation`, so a bad
//! configuration reports every problem at once instead of the first one.
//!
//! # Example
//!
//! ```rust
//! use guarded::config::AlternationConfig;
//! use std::time::Duration;
//!
//! let config = AlternationConfig::builder()
//!     .seed(7)
//!     .deadline(Duration::from_secs(5))
//!     .max_iterations(1_000)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.seed, Some(7));
//! ```

pub mod builder;
pub mod error;
pub mod settings;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigRejected};
pub use settings::{AlternationConfig, DEFAULT_RECHECK_INTERVAL};
