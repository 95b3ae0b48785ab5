//! Build errors for guard builders.

use thiserror::Error;

/// Errors that can occur when building guards.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Guard action not specified. Call .then(action) before .build()")]
    MissingAction,

    #[error("Guard label is empty. Omit .label() or give it a name")]
    EmptyLabel,
}
