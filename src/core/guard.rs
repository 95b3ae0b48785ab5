//! Guards: the candidate alternatives of an alternation.
//!
//! A guard couples a precondition, an optional input operation and an
//! action. Preconditions are re-evaluated on every attempt; a guard set is
//! meant to be rebuilt for each alternation so that it always reflects the
//! current shared state.

use super::source::{InputSource, SourceId, SourceStatus};
use std::fmt;
use tokio::sync::watch;

type Conjunct<'a> = Box<dyn Fn() -> bool + Send + 'a>;

/// Conjunction of boolean conditions, evaluated left to right.
///
/// Evaluation stops at the first false conjunct, so later conditions may
/// rely on earlier ones holding (or be expensive) without being called
/// needlessly. An empty precondition always holds.
///
/// # Example
///
/// ```rust
/// use guarded::core::Precondition;
/// use std::sync::atomic::{AtomicI64, Ordering};
///
/// let x = AtomicI64::new(4);
/// let y = AtomicI64::new(3);
///
/// // [x > y; x + y < 10 -> ...]
/// let precondition = Precondition::new(|| x.load(Ordering::SeqCst) > y.load(Ordering::SeqCst))
///     .and(|| x.load(Ordering::SeqCst) + y.load(Ordering::SeqCst) < 10);
///
/// assert!(precondition.holds());
/// y.store(9, Ordering::SeqCst);
/// assert!(!precondition.holds());
/// ```
pub struct Precondition<'a> {
    conjuncts: Vec<Conjunct<'a>>,
}

impl<'a> Precondition<'a> {
    /// A precondition that always holds.
    pub fn always() -> Self {
        Self {
            conjuncts: Vec::new(),
        }
    }

    pub fn new<F>(condition: F) -> Self
    where
        F: Fn() -> bool + Send + 'a,
    {
        Self::always().and(condition)
    }

    /// Append a conjunct, evaluated only if every earlier one holds.
    pub fn and<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + 'a,
    {
        self.conjuncts.push(Box::new(condition));
        self
    }

    pub fn holds(&self) -> bool {
        self.conjuncts.iter().all(|condition| condition())
    }

    pub fn len(&self) -> usize {
        self.conjuncts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty()
    }
}

impl Default for Precondition<'_> {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for Precondition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Precondition")
            .field("conjuncts", &self.conjuncts.len())
            .finish()
    }
}

/// Input operation with its binding action, independent of the item type.
trait Arm<'a, R>: Send {
    fn source_id(&self) -> SourceId;

    fn status(&self) -> SourceStatus;

    fn signal(&self) -> watch::Receiver<u64>;

    /// Take a value and run the action with it. `None` if no value could be
    /// taken, in which case the action is kept.
    fn fire(&mut self) -> Option<R>;
}

struct SourceArm<'a, S, F> {
    source: &'a S,
    action: Option<F>,
}

impl<'a, S, F, R> Arm<'a, R> for SourceArm<'a, S, F>
where
    S: InputSource,
    F: FnOnce(S::Item) -> R + Send + 'a,
{
    fn source_id(&self) -> SourceId {
        self.source.id()
    }

    fn status(&self) -> SourceStatus {
        self.source.status()
    }

    fn signal(&self) -> watch::Receiver<u64> {
        self.source.watch()
    }

    fn fire(&mut self) -> Option<R> {
        if self.action.is_none() {
            return None;
        }
        let value = self.source.try_receive().ok()?;
        self.action.take().map(|action| action(value))
    }
}

enum Body<'a, R> {
    Plain(Option<Box<dyn FnOnce() -> R + Send + 'a>>),
    Input(Box<dyn Arm<'a, R> + 'a>),
}

/// A single guarded alternative.
///
/// `R` is the action's return type, shared by every guard of a set. Input
/// guards may read sources of different item types within one set.
///
/// # Example
///
/// ```rust
/// use guarded::core::{Channel, Guard, Precondition};
///
/// let west: Channel<char> = Channel::new();
///
/// // west?c -> forward c
/// let forward = Guard::with_input(Precondition::always(), &west, |c: char| c.to_string());
/// // x > y -> m := x
/// let assign = Guard::new(Precondition::new(|| 3 > 2), || String::from("x"));
///
/// assert!(forward.has_input());
/// assert!(!assign.has_input());
/// ```
pub struct Guard<'a, R> {
    label: Option<String>,
    precondition: Precondition<'a>,
    body: Body<'a, R>,
}

impl<'a, R: 'a> Guard<'a, R> {
    /// Guard without input: viable whenever its precondition holds.
    pub fn new<A>(precondition: Precondition<'a>, action: A) -> Self
    where
        A: FnOnce() -> R + Send + 'a,
    {
        Self {
            label: None,
            precondition,
            body: Body::Plain(Some(Box::new(action))),
        }
    }

    /// Guard reading from `source`: viable when its precondition holds and a
    /// writer is waiting on the source. The received value is passed to the
    /// action.
    pub fn with_input<S, A>(precondition: Precondition<'a>, source: &'a S, action: A) -> Self
    where
        S: InputSource,
        A: FnOnce(S::Item) -> R + Send + 'a,
    {
        Self {
            label: None,
            precondition,
            body: Body::Input(Box::new(SourceArm {
                source,
                action: Some(action),
            })),
        }
    }

    /// Attach a name used in logs and attempt history.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl<'a, R> Guard<'a, R> {
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn has_input(&self) -> bool {
        matches!(self.body, Body::Input(_))
    }

    pub fn precondition(&self) -> &Precondition<'a> {
        &self.precondition
    }

    /// Source id and status of the input, if any.
    pub(crate) fn input_status(&self) -> Option<(SourceId, SourceStatus)> {
        match &self.body {
            Body::Plain(_) => None,
            Body::Input(arm) => Some((arm.source_id(), arm.status())),
        }
    }

    pub(crate) fn signal(&self) -> Option<watch::Receiver<u64>> {
        match &self.body {
            Body::Plain(_) => None,
            Body::Input(arm) => Some(arm.signal()),
        }
    }

    /// Run the action, taking the input value first if there is an input.
    pub(crate) fn fire(&mut self) -> Option<R> {
        match &mut self.body {
            Body::Plain(action) => action.take().map(|action| action()),
            Body::Input(arm) => arm.fire(),
        }
    }
}

impl<R> fmt::Debug for Guard<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = match &self.body {
            Body::Plain(_) => None,
            Body::Input(arm) => Some(arm.source_id()),
        };
        f.debug_struct("Guard")
            .field("label", &self.label)
            .field("precondition", &self.precondition)
            .field("input", &input)
            .finish()
    }
}

/// Ordered guards evaluated together in one alternation attempt.
///
/// Order fixes the indices reported in outcomes; it has no influence on
/// which guard is selected.
pub struct GuardSet<'a, R> {
    guards: Vec<Guard<'a, R>>,
}

impl<'a, R> GuardSet<'a, R> {
    pub fn new() -> Self {
        Self { guards: Vec::new() }
    }

    pub fn push(&mut self, guard: Guard<'a, R>) {
        self.guards.push(guard);
    }

    pub fn with(mut self, guard: Guard<'a, R>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Guard<'a, R>> {
        self.guards.iter()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Guard<'a, R>> {
        self.guards.get_mut(index)
    }
}

impl<R> Default for GuardSet<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R> From<Vec<Guard<'a, R>>> for GuardSet<'a, R> {
    fn from(guards: Vec<Guard<'a, R>>) -> Self {
        Self { guards }
    }
}

impl<'a, R> FromIterator<Guard<'a, R>> for GuardSet<'a, R> {
    fn from_iter<I: IntoIterator<Item = Guard<'a, R>>>(iter: I) -> Self {
        Self {
            guards: iter.into_iter().collect(),
        }
    }
}

impl<'a, R> Extend<Guard<'a, R>> for GuardSet<'a, R> {
    fn extend<I: IntoIterator<Item = Guard<'a, R>>>(&mut self, iter: I) {
        self.guards.extend(iter);
    }
}

impl<R> fmt::Debug for GuardSet<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.guards.iter()).finish()
    }
}
