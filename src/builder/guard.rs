//! Builders for constructing guards.

use crate::builder::error::BuildError;
use crate::core::{Guard, InputSource, Precondition};

type PlainAction<'a, R> = Box<dyn FnOnce() -> R + Send + 'a>;
type InputAction<'a, T, R> = Box<dyn FnOnce(T) -> R + Send + 'a>;

/// Anything that can be turned into a guard.
pub trait BuildGuard<'a, R> {
    fn build(self) -> Result<Guard<'a, R>, BuildError>;
}

fn checked_label(label: Option<String>) -> Result<Option<String>, BuildError> {
    match label {
        Some(label) if label.trim().is_empty() => Err(BuildError::EmptyLabel),
        label => Ok(label),
    }
}

/// Builder for guards with a fluent API.
///
/// Starts as a guard without input; calling [`input`](Self::input) turns
/// it into an [`InputGuardBuilder`].
///
/// # Example
///
/// ```rust
/// use guarded::builder::GuardBuilder;
///
/// let (x, y) = (2, 7);
///
/// // y > x -> m := y
/// let guard = GuardBuilder::when(move || y > x)
///     .label("m := y")
///     .then(move || y)
///     .build()
///     .unwrap();
///
/// assert_eq!(guard.label(), Some("m := y"));
/// assert!(guard.precondition().holds());
/// ```
pub struct GuardBuilder<'a, R> {
    label: Option<String>,
    precondition: Precondition<'a>,
    action: Option<PlainAction<'a, R>>,
}

impl<'a, R: 'a> GuardBuilder<'a, R> {
    /// Builder whose precondition always holds.
    pub fn new() -> Self {
        Self {
            label: None,
            precondition: Precondition::always(),
            action: None,
        }
    }

    /// Builder starting from a first precondition conjunct.
    pub fn when<F>(condition: F) -> Self
    where
        F: Fn() -> bool + Send + 'a,
    {
        Self {
            precondition: Precondition::new(condition),
            ..Self::new()
        }
    }

    /// Add a conjunct, evaluated only when the earlier ones hold.
    pub fn and<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + 'a,
    {
        self.precondition = self.precondition.and(condition);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Read from `source` when selected.
    pub fn input<S: InputSource>(self, source: &'a S) -> InputGuardBuilder<'a, S, R> {
        InputGuardBuilder {
            label: self.label,
            precondition: self.precondition,
            source,
            action: None,
        }
    }

    /// Set the action (required).
    pub fn then<A>(mut self, action: A) -> Self
    where
        A: FnOnce() -> R + Send + 'a,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn build(self) -> Result<Guard<'a, R>, BuildError> {
        let action = self.action.ok_or(BuildError::MissingAction)?;
        let guard = Guard::new(self.precondition, action);
        Ok(match checked_label(self.label)? {
            Some(label) => guard.labeled(label),
            None => guard,
        })
    }
}

impl<'a, R: 'a> Default for GuardBuilder<'a, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R: 'a> Guard<'a, R> {
    /// Start a [`GuardBuilder`] from a first precondition conjunct.
    ///
    /// # Example
    ///
    /// ```rust
    /// use guarded::core::{Channel, Guard};
    ///
    /// let west: Channel<char> = Channel::new();
    ///
    /// // x > 0; west?c -> c
    /// let x = 3;
    /// let guard = Guard::when(move || x > 0)
    ///     .input(&west)
    ///     .then(|c: char| c)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(guard.has_input());
    /// ```
    pub fn when<F>(condition: F) -> GuardBuilder<'a, R>
    where
        F: Fn() -> bool + Send + 'a,
    {
        GuardBuilder::when(condition)
    }

    /// Start a [`GuardBuilder`] whose precondition always holds.
    pub fn always() -> GuardBuilder<'a, R> {
        GuardBuilder::new()
    }
}

impl<'a, R: 'a> BuildGuard<'a, R> for GuardBuilder<'a, R> {
    fn build(self) -> Result<Guard<'a, R>, BuildError> {
        GuardBuilder::build(self)
    }
}

/// Builder for guards that read from an input source.
pub struct InputGuardBuilder<'a, S: InputSource, R> {
    label: Option<String>,
    precondition: Precondition<'a>,
    source: &'a S,
    action: Option<InputAction<'a, S::Item, R>>,
}

impl<'a, S: InputSource, R: 'a> InputGuardBuilder<'a, S, R> {
    /// Add a conjunct, evaluated only when the earlier ones hold.
    pub fn and<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + 'a,
    {
        self.precondition = self.precondition.and(condition);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the action receiving the input value (required).
    pub fn then<A>(mut self, action: A) -> Self
    where
        A: FnOnce(S::Item) -> R + Send + 'a,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn build(self) -> Result<Guard<'a, R>, BuildError> {
        let action = self.action.ok_or(BuildError::MissingAction)?;
        let guard = Guard::with_input(self.precondition, self.source, action);
        Ok(match checked_label(self.label)? {
            Some(label) => guard.labeled(label),
            None => guard,
        })
    }
}

impl<'a, S: InputSource, R: 'a> BuildGuard<'a, R> for InputGuardBuilder<'a, S, R> {
    fn build(self) -> Result<Guard<'a, R>, BuildError> {
        InputGuardBuilder::build(self)
    }
}
