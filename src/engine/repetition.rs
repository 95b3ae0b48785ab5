//! Repeated alternation until no guard is viable.

use crate::core::{AlternationHistory, AttemptRecord, GuardSet, Outcome};
use crate::engine::alternation::Alternation;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Action results a repetition knows how to interpret.
///
/// `()` always continues. `Err` from a `Result<(), E>` stops the loop and
/// is returned to the caller unchanged.
pub trait Completion {
    type Error;

    fn into_result(self) -> Result<(), Self::Error>;
}

impl Completion for () {
    type Error = Infallible;

    fn into_result(self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl<E> Completion for Result<(), E> {
    type Error = E;

    fn into_result(self) -> Result<(), E> {
        self
    }
}

/// Why a repetition stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// An attempt found no viable guard
    Exhausted,

    /// A blocking attempt was cancelled or timed out
    Cancelled,

    /// The configured iteration limit was reached
    IterationLimit,
}

/// Summary of a finished repetition.
#[derive(Clone, Debug)]
pub struct RepetitionReport {
    /// Alternation attempts made, including the final one
    pub attempts: usize,
    /// Attempts that selected a guard
    pub selections: usize,
    pub termination: Termination,
    /// Per-attempt history, when enabled in the configuration
    pub history: Option<AlternationHistory>,
}

struct Progress {
    attempts: usize,
    selections: usize,
    history: Option<AlternationHistory>,
}

impl Progress {
    fn new(record_history: bool) -> Self {
        Self {
            attempts: 0,
            selections: 0,
            history: record_history.then(AlternationHistory::new),
        }
    }

    fn limit_reached(&self, limit: Option<usize>) -> bool {
        limit.is_some_and(|limit| self.attempts >= limit)
    }

    fn observe<R: Completion>(
        &mut self,
        outcome: Outcome<R>,
    ) -> Result<Option<Termination>, R::Error> {
        self.attempts += 1;
        if let Some(history) = self.history.take() {
            let record = AttemptRecord::from_outcome(self.attempts, &outcome);
            self.history = Some(history.record(record));
        }

        match outcome {
            Outcome::Selected(selection) => {
                self.selections += 1;
                selection.output.into_result()?;
                Ok(None)
            }
            Outcome::Exhausted => Ok(Some(Termination::Exhausted)),
            Outcome::Cancelled => Ok(Some(Termination::Cancelled)),
        }
    }

    fn finish(self, termination: Termination) -> RepetitionReport {
        debug!(
            attempts = self.attempts,
            selections = self.selections,
            ?termination,
            "repetition finished"
        );
        RepetitionReport {
            attempts: self.attempts,
            selections: self.selections,
            termination,
            history: self.history,
        }
    }
}

impl Alternation {
    /// CSP repetitive command over non-blocking alternations.
    ///
    /// Calls `factory` for a fresh guard set before every attempt, so
    /// preconditions always see current state. Stops at the first
    /// `Exhausted` attempt, at the configured iteration limit, or at the
    /// first action that returns `Err`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use guarded::builder::guard;
    /// use guarded::core::GuardSet;
    /// use guarded::engine::{Alternation, Termination};
    /// use std::sync::atomic::{AtomicI64, Ordering};
    ///
    /// let x = AtomicI64::new(0);
    /// let x = &x;
    /// let mut engine = Alternation::new();
    ///
    /// // *[x < 3 -> x := x + 1]
    /// let report = engine
    ///     .repeat(move || {
    ///         GuardSet::new().with(guard(
    ///             move || x.load(Ordering::SeqCst) < 3,
    ///             move || {
    ///                 x.fetch_add(1, Ordering::SeqCst);
    ///             },
    ///         ))
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(x.load(Ordering::SeqCst), 3);
    /// assert_eq!(report.attempts, 4);
    /// assert_eq!(report.termination, Termination::Exhausted);
    /// ```
    pub fn repeat<'a, R, F>(&mut self, mut factory: F) -> Result<RepetitionReport, R::Error>
    where
        F: FnMut() -> GuardSet<'a, R>,
        R: Completion,
    {
        let mut progress = Progress::new(self.config().record_history);
        let limit = self.config().max_iterations;

        loop {
            if progress.limit_reached(limit) {
                return Ok(progress.finish(Termination::IterationLimit));
            }
            let outcome = self.evaluate(factory());
            if let Some(termination) = progress.observe(outcome)? {
                return Ok(progress.finish(termination));
            }
        }
    }

    /// CSP repetitive command over blocking alternations.
    ///
    /// Like [`repeat`](Self::repeat), but each attempt waits for input
    /// instead of giving up. The loop ends when no guard is live any more
    /// (every precondition false or every input closed), when `cancel`
    /// fires, or when an attempt hits the configured deadline.
    pub async fn repeat_blocking<'a, R, F>(
        &mut self,
        mut factory: F,
        cancel: &CancellationToken,
    ) -> Result<RepetitionReport, R::Error>
    where
        F: FnMut() -> GuardSet<'a, R>,
        R: Completion,
    {
        let mut progress = Progress::new(self.config().record_history);
        let limit = self.config().max_iterations;

        loop {
            if progress.limit_reached(limit) {
                return Ok(progress.finish(Termination::IterationLimit));
            }
            let outcome = self.evaluate_blocking(factory(), cancel).await;
            if let Some(termination) = progress.observe(outcome)? {
                return Ok(progress.finish(termination));
            }
        }
    }
}

/// Repeat with a fresh default engine.
pub fn repeat<'a, R, F>(factory: F) -> Result<RepetitionReport, R::Error>
where
    F: FnMut() -> GuardSet<'a, R>,
    R: Completion,
{
    Alternation::new().repeat(factory)
}
