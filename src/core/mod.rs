//! Core alternation types.
//!
//! This module contains the data the engine works on:
//! - Input sources and the rendezvous `Channel`
//! - Guards, their preconditions and guard sets
//! - Alternation outcomes
//! - Attempt history
//!
//! Nothing here selects between guards; that is the job of
//! [`crate::engine`].

mod guard;
mod history;
mod outcome;
mod source;

pub use guard::{Guard, GuardSet, Precondition};
pub use history::{AlternationHistory, AttemptKind, AttemptRecord};
pub use outcome::{Outcome, Selection};
pub use source::{
    Channel, ClosedSourceError, InputSource, SourceId, SourceStatus, TryReceiveError,
};
