//! Attempt history for alternation loops.
//!
//! A repetition records one entry per alternation attempt. The history is
//! plain data: it can be serialized for diagnostics and inspected to check
//! how evenly selections were spread across guards.

use super::outcome::Outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// What a single attempt ended with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptKind {
    Selected,
    Exhausted,
    Cancelled,
}

/// Record of one alternation attempt.
///
/// # Example
///
/// ```rust
/// use guarded::core::{AttemptKind, AttemptRecord, Outcome};
///
/// let outcome: Outcome<()> = Outcome::Exhausted;
/// let record = AttemptRecord::from_outcome(1, &outcome);
///
/// assert_eq!(record.kind, AttemptKind::Exhausted);
/// assert_eq!(record.index, None);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number within the loop
    pub attempt: usize,
    pub kind: AttemptKind,
    /// Index of the selected guard
    pub index: Option<usize>,
    /// Label of the selected guard
    pub label: Option<String>,
    pub received: bool,
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn from_outcome<R>(attempt: usize, outcome: &Outcome<R>) -> Self {
        let (kind, selection) = match outcome {
            Outcome::Selected(selection) => (AttemptKind::Selected, Some(selection)),
            Outcome::Exhausted => (AttemptKind::Exhausted, None),
            Outcome::Cancelled => (AttemptKind::Cancelled, None),
        };
        Self {
            attempt,
            kind,
            index: selection.map(|s| s.index),
            label: selection.and_then(|s| s.label.clone()),
            received: selection.is_some_and(|s| s.received),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered history of alternation attempts.
///
/// # Example
///
/// ```rust
/// use guarded::core::{AlternationHistory, AttemptRecord, Outcome, Selection};
///
/// let picked = Outcome::Selected(Selection {
///     index: 1,
///     label: None,
///     received: false,
///     output: (),
/// });
///
/// let history = AlternationHistory::new()
///     .record(AttemptRecord::from_outcome(1, &picked))
///     .record(AttemptRecord::from_outcome(2, &Outcome::<()>::Exhausted));
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.selection_counts().get(&1), Some(&1));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternationHistory {
    attempts: Vec<AttemptRecord>,
}

impl AlternationHistory {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    /// Append an attempt, returning the extended history.
    pub fn record(mut self, attempt: AttemptRecord) -> Self {
        self.attempts.push(attempt);
        self
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn last(&self) -> Option<&AttemptRecord> {
        self.attempts.last()
    }

    /// Attempts that selected a guard, in order.
    pub fn selections(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.attempts
            .iter()
            .filter(|attempt| attempt.kind == AttemptKind::Selected)
    }

    /// How many times each guard index was selected.
    pub fn selection_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for index in self.selections().filter_map(|attempt| attempt.index) {
            *counts.entry(index).or_insert(0) += 1;
        }
        counts
    }

    /// Time between the first and last recorded attempts.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.attempts.first()?;
        let last = self.attempts.last()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Selection;

    fn selected(index: usize, label: Option<&str>) -> Outcome<()> {
        Outcome::Selected(Selection {
            index,
            label: label.map(str::to_owned),
            received: true,
            output: (),
        })
    }

    #[test]
    fn record_from_selection_copies_details() {
        let record = AttemptRecord::from_outcome(3, &selected(4, Some("west")));

        assert_eq!(record.attempt, 3);
        assert_eq!(record.kind, AttemptKind::Selected);
        assert_eq!(record.index, Some(4));
        assert_eq!(record.label.as_deref(), Some("west"));
        assert!(record.received);
    }

    #[test]
    fn record_from_cancellation_has_no_index() {
        let record = AttemptRecord::from_outcome(1, &Outcome::<()>::Cancelled);

        assert_eq!(record.kind, AttemptKind::Cancelled);
        assert_eq!(record.index, None);
        assert!(!record.received);
    }

    #[test]
    fn history_preserves_order() {
        let history = AlternationHistory::new()
            .record(AttemptRecord::from_outcome(1, &selected(0, None)))
            .record(AttemptRecord::from_outcome(2, &selected(1, None)))
            .record(AttemptRecord::from_outcome(3, &Outcome::<()>::Exhausted));

        let numbers: Vec<_> = history.attempts().iter().map(|a| a.attempt).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(history.last().map(|a| a.kind), Some(AttemptKind::Exhausted));
    }

    #[test]
    fn selection_counts_skip_exhaustion() {
        let history = AlternationHistory::new()
            .record(AttemptRecord::from_outcome(1, &selected(0, None)))
            .record(AttemptRecord::from_outcome(2, &selected(0, None)))
            .record(AttemptRecord::from_outcome(3, &selected(2, None)))
            .record(AttemptRecord::from_outcome(4, &Outcome::<()>::Exhausted));

        let counts = history.selection_counts();
        assert_eq!(counts.get(&0), Some(&2));
        assert_eq!(counts.get(&2), Some(&1));
        assert_eq!(counts.len(), 2);
        assert_eq!(history.selections().count(), 3);
    }

    #[test]
    fn empty_history_has_no_duration() {
        let history = AlternationHistory::new();

        assert!(history.is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn history_has_duration_once_recorded() {
        let history = AlternationHistory::new()
            .record(AttemptRecord::from_outcome(1, &selected(0, None)))
            .record(AttemptRecord::from_outcome(2, &Outcome::<()>::Exhausted));

        assert!(history.duration().is_some());
    }

    #[test]
    fn history_serializes_round_trip() {
        let history = AlternationHistory::new()
            .record(AttemptRecord::from_outcome(1, &selected(1, Some("north"))));

        let json = serde_json::to_string(&history).unwrap();
        let restored: AlternationHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, restored);
    }
}
