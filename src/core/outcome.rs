//! Results of an alternation attempt.

/// The guard that won an alternation, and what its action returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<R> {
    /// Position of the guard within its set
    pub index: usize,
    /// The guard's label, if it had one
    pub label: Option<String>,
    /// Whether a value was taken from an input source
    pub received: bool,
    /// Return value of the guard's action, passed through untouched
    pub output: R,
}

/// Outcome of one alternation attempt.
///
/// `Exhausted` and `Cancelled` are ordinary results, not errors: an empty
/// or fully blocked guard set is how a repetition learns it is finished.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<R> {
    /// Exactly one guard's action ran
    Selected(Selection<R>),

    /// No guard was viable
    Exhausted,

    /// A blocking attempt was cancelled or hit its deadline before any
    /// guard became viable
    Cancelled,
}

impl<R> Outcome<R> {
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn selection(&self) -> Option<&Selection<R>> {
        match self {
            Self::Selected(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selection().map(|selection| selection.index)
    }

    /// The selected action's return value, if a guard was selected.
    pub fn into_output(self) -> Option<R> {
        match self {
            Self::Selected(selection) => Some(selection.output),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(index: usize) -> Outcome<&'static str> {
        Outcome::Selected(Selection {
            index,
            label: None,
            received: false,
            output: "ran",
        })
    }

    #[test]
    fn selected_exposes_index_and_output() {
        let outcome = selected(2);

        assert!(outcome.is_selected());
        assert_eq!(outcome.selected_index(), Some(2));
        assert_eq!(outcome.into_output(), Some("ran"));
    }

    #[test]
    fn exhausted_and_cancelled_carry_nothing() {
        let exhausted: Outcome<()> = Outcome::Exhausted;
        let cancelled: Outcome<()> = Outcome::Cancelled;

        assert!(exhausted.is_exhausted());
        assert!(cancelled.is_cancelled());
        assert_eq!(exhausted.selected_index(), None);
        assert_eq!(cancelled.into_output(), None);
    }
}
