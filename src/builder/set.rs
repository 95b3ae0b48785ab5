//! Builder for constructing guard sets.

use crate::builder::error::BuildError;
use crate::builder::guard::BuildGuard;
use crate::core::{Guard, GuardSet};

/// Builder for guard sets with a fluent API.
///
/// An empty set is valid: evaluating it is simply `Exhausted`.
pub struct GuardSetBuilder<'a, R> {
    guards: Vec<Guard<'a, R>>,
}

impl<'a, R> GuardSetBuilder<'a, R> {
    pub fn new() -> Self {
        Self { guards: Vec::new() }
    }

    /// Add a guard from a builder.
    /// Returns an error if the builder fails validation.
    pub fn guard<B>(mut self, builder: B) -> Result<Self, BuildError>
    where
        B: BuildGuard<'a, R>,
    {
        self.guards.push(builder.build()?);
        Ok(self)
    }

    /// Add a pre-built guard.
    pub fn add_guard(mut self, guard: Guard<'a, R>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Add multiple guards at once.
    pub fn guards(mut self, guards: impl IntoIterator<Item = Guard<'a, R>>) -> Self {
        self.guards.extend(guards);
        self
    }

    pub fn build(self) -> GuardSet<'a, R> {
        GuardSet::from(self.guards)
    }
}

impl<R> Default for GuardSetBuilder<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{always, GuardBuilder};
    use crate::core::Channel;

    #[test]
    fn empty_builder_gives_empty_set() {
        let set = GuardSetBuilder::<()>::new().build();

        assert!(set.is_empty());
    }

    #[test]
    fn builder_propagates_guard_errors() {
        let result = GuardSetBuilder::<()>::new().guard(GuardBuilder::when(|| true));

        assert!(matches!(result, Err(BuildError::MissingAction)));
    }

    #[test]
    fn fluent_api_builds_set_in_order() {
        let channel: Channel<char> = Channel::new();

        let set = GuardSetBuilder::new()
            .guard(GuardBuilder::when(|| true).label("plain").then(|| 'p'))
            .unwrap()
            .guard(
                GuardBuilder::new()
                    .label("west?c")
                    .input(&channel)
                    .then(|c: char| c),
            )
            .unwrap()
            .add_guard(always(|| 'a').labeled("always"))
            .guards(vec![always(|| 'b'), always(|| 'c')])
            .build();

        let labels: Vec<_> = set.iter().map(Guard::label).collect();
        assert_eq!(
            labels,
            vec![Some("plain"), Some("west?c"), Some("always"), None, None]
        );
    }
}
