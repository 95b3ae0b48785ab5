//! Macros for ergonomic guard set construction.

/// Build a [`GuardSet`](crate::core::GuardSet) from a list of guards.
///
/// # Example
///
/// ```
/// use guarded::builder::{always, guard};
/// use guarded::guard_set;
///
/// let (x, y) = (1, 1);
///
/// let guards = guard_set![
///     guard(move || x > y, move || "x"),
///     guard(move || y > x, move || "y"),
///     always(|| "equal"),
/// ];
///
/// assert_eq!(guards.len(), 3);
/// ```
#[macro_export]
macro_rules! guard_set {
    () => {
        $crate::core::GuardSet::new()
    };

    ($($guard:expr),+ $(,)?) => {
        $crate::core::GuardSet::from(vec![$($guard),+])
    };
}
