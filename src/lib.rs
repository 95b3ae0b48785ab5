//! Guarded: fair CSP alternation for Rust
//!
//! Guarded implements Hoare's CSP *alternative command* `[G1 -> S1 | G2 -> S2]`
//! and *repetitive command* `*[...]` as a library. A guard is a boolean
//! precondition, an optional input from a rendezvous channel, and an action.
//! The engine picks uniformly at random among the guards that are viable
//! right now, runs exactly one action, and reports `Exhausted` when nothing
//! is viable, which is what ends a repetition.
//!
//! # Core Concepts
//!
//! - **Guards**: precondition + optional input + action, rebuilt per attempt
//! - **Channels**: unbuffered rendezvous sources that can be closed
//! - **Alternation**: one fair selection, non-blocking or blocking
//! - **Repetition**: alternation until exhausted
//!
//! Closed input sources remove their guards from consideration
//! unconditionally, and preconditions short-circuit left to right.
//!
//! # Example
//!
//! ```rust
//! use guarded::builder::guard;
//! use guarded::engine::{Alternation, Termination};
//! use guarded::guard_set;
//! use std::sync::atomic::{AtomicI64, Ordering};
//!
//! // *[x > y -> x := x - y | y > x -> y := y - x]
//! let x = AtomicI64::new(12);
//! let y = AtomicI64::new(18);
//! let (x, y) = (&x, &y);
//!
//! let mut engine = Alternation::new();
//! let report = engine
//!     .repeat(move || {
//!         let (a, b) = (x.load(Ordering::SeqCst), y.load(Ordering::SeqCst));
//!         guard_set![
//!             guard(move || a > b, move || {
//!                 x.store(a - b, Ordering::SeqCst);
//!             }),
//!             guard(move || b > a, move || {
//!                 y.store(b - a, Ordering::SeqCst);
//!             }),
//!         ]
//!     })
//!     .unwrap();
//!
//! assert_eq!(x.load(Ordering::SeqCst), 6);
//! assert_eq!(report.termination, Termination::Exhausted);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use crate::config::AlternationConfig;
pub use crate::core::{
    Channel, Guard, GuardSet, InputSource, Outcome, Precondition, Selection, SourceStatus,
};
pub use crate::engine::{evaluate, repeat, Alternation, RepetitionReport, Termination};
