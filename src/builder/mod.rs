//! Builder API for ergonomic guard construction.
//!
//! This module provides fluent builders, helper constructors and a macro for
//! writing guard sets with little ceremony.

pub mod error;
pub mod guard;
pub mod macros;
pub mod set;

pub use error::BuildError;
pub use guard::{BuildGuard, GuardBuilder, InputGuardBuilder};
pub use set::GuardSetBuilder;

use crate::core::{Guard, InputSource, Precondition};

/// Guard without input, gated by a single condition.
///
/// # Example
///
/// ```
/// use guarded::builder::guard;
/// use guarded::core::GuardSet;
/// use guarded::engine::evaluate;
///
/// let (x, y) = (4, 1);
/// let outcome = evaluate(GuardSet::new().with(guard(move || x > y, move || x)));
///
/// assert_eq!(outcome.into_output(), Some(4));
/// ```
pub fn guard<'a, R, P, A>(condition: P, action: A) -> Guard<'a, R>
where
    R: 'a,
    P: Fn() -> bool + Send + 'a,
    A: FnOnce() -> R + Send + 'a,
{
    Guard::new(Precondition::new(condition), action)
}

/// Guard without input whose precondition always holds.
pub fn always<'a, R, A>(action: A) -> Guard<'a, R>
where
    R: 'a,
    A: FnOnce() -> R + Send + 'a,
{
    Guard::new(Precondition::always(), action)
}

/// Guard reading from `source`, gated by a single condition.
///
/// # Example
///
/// ```
/// use guarded::builder::input_guard;
/// use guarded::core::{Channel, GuardSet, InputSource};
/// use guarded::engine::evaluate;
///
/// let north: Channel<char> = Channel::new();
/// north.close();
///
/// // A closed source removes its guard, whatever the condition says.
/// let outcome = evaluate(GuardSet::new().with(input_guard(|| true, &north, |c: char| c)));
///
/// assert!(outcome.is_exhausted());
/// ```
pub fn input_guard<'a, S, R, P, A>(condition: P, source: &'a S, action: A) -> Guard<'a, R>
where
    S: InputSource,
    R: 'a,
    P: Fn() -> bool + Send + 'a,
    A: FnOnce(S::Item) -> R + Send + 'a,
{
    Guard::with_input(Precondition::new(condition), source, action)
}
