//! The alternation engine.
//!
//! This module turns guard sets into decisions:
//!
//! - **Alternation**: one fair choice among the currently viable guards,
//!   either non-blocking (`evaluate`) or waiting for input
//!   (`evaluate_blocking`)
//! - **Repetition**: alternation in a loop until no guard is viable
//!   (`repeat`, `repeat_blocking`)
//!
//! Ties are always broken uniformly at random. A guard whose input source
//! is closed is never a candidate, whatever its precondition says.

mod alternation;
mod repetition;

pub use alternation::{evaluate, Alternation};
pub use repetition::{repeat, Completion, RepetitionReport, Termination};
