//! Fair selection among viable guards.

use crate::config::{AlternationConfig, ConfigRejected};
use crate::core::{GuardSet, Outcome, Selection, SourceId, SourceStatus};
use futures::future::select_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::future::pending;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Result of one pass over a guard set
enum Scan<R> {
    /// A guard was chosen and its action ran
    Fired(Selection<R>),

    /// Nothing viable yet, but some guard could still become viable
    Pending,

    /// Every guard has a false precondition or a closed source
    Dead,
}

/// The alternation engine.
///
/// Holds configuration and the random source used for tie-breaking; no
/// selection state survives between calls. One task drives one engine.
///
/// # Example
///
/// ```rust
/// use guarded::builder::guard;
/// use guarded::core::{GuardSet, Outcome};
/// use guarded::engine::Alternation;
///
/// let (x, y) = (5, 3);
/// let mut engine = Alternation::new();
///
/// // [x >= y -> m := x | y >= x -> m := y]
/// let guards = GuardSet::new()
///     .with(guard(move || x >= y, move || x))
///     .with(guard(move || y >= x, move || y));
///
/// let m = engine.evaluate(guards).into_output();
/// assert_eq!(m, Some(5));
/// ```
pub struct Alternation {
    config: AlternationConfig,
    rng: StdRng,
}

impl Alternation {
    /// Engine with default configuration and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::from_checked(AlternationConfig::default())
    }

    /// Engine with a custom configuration, rejected if invalid.
    pub fn with_config(config: AlternationConfig) -> Result<Self, ConfigRejected> {
        config.check()?;
        Ok(Self::from_checked(config))
    }

    fn from_checked(config: AlternationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &AlternationConfig {
        &self.config
    }

    /// Run one non-blocking alternation.
    ///
    /// Evaluates every precondition, probes the inputs of guards whose
    /// precondition holds, then picks one viable guard uniformly at random
    /// and runs its action. Returns `Exhausted` immediately when nothing is
    /// viable.
    pub fn evaluate<R>(&mut self, mut guards: GuardSet<'_, R>) -> Outcome<R> {
        match self.attempt(&mut guards) {
            Scan::Fired(selection) => Outcome::Selected(selection),
            Scan::Pending | Scan::Dead => {
                debug!(guards = guards.len(), "alternation exhausted");
                Outcome::Exhausted
            }
        }
    }

    /// Run one alternation, waiting for a guard to become viable.
    ///
    /// Returns `Exhausted` without waiting when no guard can ever become
    /// viable under the current preconditions (all false, or every input
    /// closed). Returns `Cancelled` when `cancel` fires or the configured
    /// deadline passes first. Every wake-up re-runs the full fair
    /// selection, so the source that woke the task gets no head start.
    ///
    /// A set whose preconditions are all false does not wait for another
    /// task to flip them. To wait on shared state, keep a guard live with an
    /// idle input and let the configured `recheck_interval` re-evaluate the
    /// preconditions.
    ///
    /// Values are only taken from sources inside a selection that runs the
    /// action right away. Cancellation therefore never loses a value: it is
    /// either delivered to its guard or left with its writer.
    pub async fn evaluate_blocking<R>(
        &mut self,
        mut guards: GuardSet<'_, R>,
        cancel: &CancellationToken,
    ) -> Outcome<R> {
        let deadline = self.config.deadline.map(|limit| Instant::now() + limit);
        let recheck = self.config.recheck_interval;

        loop {
            if cancel.is_cancelled() || deadline.is_some_and(|at| Instant::now() >= at) {
                debug!(guards = guards.len(), "blocking alternation cancelled");
                return Outcome::Cancelled;
            }

            // Subscribe before probing so a writer arriving mid-scan still
            // wakes us.
            let mut signals: Vec<watch::Receiver<u64>> =
                guards.iter().filter_map(|guard| guard.signal()).collect();

            match self.attempt(&mut guards) {
                Scan::Fired(selection) => return Outcome::Selected(selection),
                Scan::Dead => {
                    debug!(guards = guards.len(), "no live guard, alternation exhausted");
                    return Outcome::Exhausted;
                }
                Scan::Pending => {}
            }

            trace!(sources = signals.len(), "alternation waiting");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(guards = guards.len(), "blocking alternation cancelled");
                    return Outcome::Cancelled;
                }
                _ = wait_until(deadline) => {
                    debug!(guards = guards.len(), "blocking alternation deadline elapsed");
                    return Outcome::Cancelled;
                }
                _ = any_signal(&mut signals) => {}
                _ = wait_for(recheck) => {}
            }
        }
    }

    fn attempt<R>(&mut self, guards: &mut GuardSet<'_, R>) -> Scan<R> {
        let mut live = false;
        let mut candidates = Vec::new();
        // One candidate per ready source: (chosen guard, guards seen)
        let mut readers: HashMap<SourceId, (usize, usize)> = HashMap::new();

        for (index, guard) in guards.iter().enumerate() {
            if !guard.precondition().holds() {
                continue;
            }
            match guard.input_status() {
                None => {
                    live = true;
                    candidates.push(index);
                }
                Some((_, SourceStatus::Closed)) => {}
                Some((_, SourceStatus::Idle)) => live = true,
                Some((source, SourceStatus::WriterWaiting)) => {
                    live = true;
                    let slot = readers.entry(source).or_insert((index, 0));
                    slot.1 += 1;
                    if self.rng.gen_range(0..slot.1) == 0 {
                        slot.0 = index;
                    }
                }
            }
        }

        candidates.extend(readers.values().map(|(index, _)| *index));
        // HashMap order is arbitrary; keep seeded runs reproducible.
        candidates.sort_unstable();
        trace!(viable = ?candidates, live, "alternation candidates");

        while !candidates.is_empty() {
            let index = candidates.swap_remove(self.rng.gen_range(0..candidates.len()));
            let Some(guard) = guards.get_mut(index) else {
                continue;
            };
            let received = guard.has_input();
            if let Some(output) = guard.fire() {
                let label = guard.label().map(str::to_owned);
                debug!(index, label = label.as_deref(), received, "guard selected");
                return Scan::Fired(Selection {
                    index,
                    label,
                    received,
                    output,
                });
            }
            trace!(index, "offer taken by a competing reader");
        }

        if live {
            Scan::Pending
        } else {
            Scan::Dead
        }
    }
}

impl Default for Alternation {
    fn default() -> Self {
        Self::new()
    }
}

/// One non-blocking alternation with a fresh default engine.
pub fn evaluate<R>(guards: GuardSet<'_, R>) -> Outcome<R> {
    Alternation::new().evaluate(guards)
}

async fn any_signal(signals: &mut [watch::Receiver<u64>]) {
    if signals.is_empty() {
        return pending().await;
    }
    let changes = signals
        .iter_mut()
        .map(|signal| Box::pin(signal.changed()));
    let _ = select_all(changes).await;
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}

async fn wait_for(interval: Option<Duration>) {
    match interval {
        Some(period) => sleep(period).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{always, guard, input_guard};
    use crate::core::{Channel, Guard, InputSource, Precondition};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn seeded(seed: u64) -> Alternation {
        let config = AlternationConfig {
            seed: Some(seed),
            ..AlternationConfig::default()
        };
        Alternation::with_config(config).unwrap()
    }

    async fn wait_for_writers<T: Send>(channel: &Channel<T>, count: usize) {
        while channel.waiting_writers() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[test]
    fn empty_set_is_exhausted() {
        let mut engine = seeded(1);

        let outcome = engine.evaluate(GuardSet::<()>::new());

        assert!(outcome.is_exhausted());
    }

    #[test]
    fn false_preconditions_are_never_selected() {
        let mut engine = seeded(2);

        for _ in 0..50 {
            let guards = GuardSet::new()
                .with(guard(|| false, || 0))
                .with(guard(|| true, || 1))
                .with(guard(|| false, || 2));
            assert_eq!(engine.evaluate(guards).selected_index(), Some(1));
        }
    }

    #[test]
    fn short_circuit_skips_later_conjuncts() {
        let a_calls = AtomicUsize::new(0);
        let b_calls = AtomicUsize::new(0);
        let mut engine = seeded(3);

        let precondition = Precondition::new(|| {
            a_calls.fetch_add(1, Ordering::SeqCst);
            false
        })
        .and(|| {
            b_calls.fetch_add(1, Ordering::SeqCst);
            true
        });
        let outcome = engine.evaluate(GuardSet::new().with(Guard::new(precondition, || ())));

        assert!(outcome.is_exhausted());
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn only_the_selected_action_runs() {
        let runs = AtomicUsize::new(0);
        let mut engine = seeded(4);

        let guards = GuardSet::new()
            .with(always(|| runs.fetch_add(1, Ordering::SeqCst)))
            .with(always(|| runs.fetch_add(1, Ordering::SeqCst)))
            .with(always(|| runs.fetch_add(1, Ordering::SeqCst)));
        assert!(engine.evaluate(guards).is_selected());

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn selection_reports_label() {
        let mut engine = seeded(5);

        let outcome = engine.evaluate(GuardSet::new().with(always(|| ()).labeled("skip")));

        let selection = outcome.selection().unwrap();
        assert_eq!(selection.label.as_deref(), Some("skip"));
        assert!(!selection.received);
    }

    #[test]
    fn same_seed_selects_same_sequence() {
        let picks = |seed| {
            let mut engine = seeded(seed);
            (0..32)
                .map(|_| {
                    let guards: GuardSet<'_, usize> =
                        (0..4).map(|i| always(move || i)).collect();
                    engine.evaluate(guards).into_output().unwrap()
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(picks(11), picks(11));
    }

    #[test]
    fn selection_output_may_borrow_local_data() {
        let names = [String::from("west"), String::from("north")];
        let channel: Channel<usize> = Channel::new();
        let mut engine = seeded(16);

        let guards = GuardSet::new()
            .with(input_guard(|| true, &channel, |i: usize| names[i].as_str()))
            .with(always(|| names[1].as_str()));
        let outcome = engine.evaluate(guards);

        assert_eq!(outcome.into_output(), Some("north"));
    }

    #[tokio::test]
    async fn all_false_preconditions_do_not_wait() {
        let mut engine = seeded(17);

        let outcome = engine
            .evaluate_blocking(
                GuardSet::new().with(guard(|| false, || ())),
                &CancellationToken::new(),
            )
            .await;

        assert!(outcome.is_exhausted());
    }

    #[test]
    fn closed_source_excludes_guard() {
        let channel: Channel<u8> = Channel::new();
        channel.close();
        let mut engine = seeded(6);

        let outcome = engine.evaluate(GuardSet::new().with(input_guard(|| true, &channel, |v: u8| v)));

        assert!(outcome.is_exhausted());
    }

    #[test]
    #[should_panic(expected = "action failed")]
    fn action_panics_reach_the_caller() {
        let mut engine = seeded(7);

        engine.evaluate(GuardSet::new().with(always(|| -> () { panic!("action failed") })));
    }

    #[tokio::test]
    async fn input_guard_receives_waiting_value() {
        let channel = Channel::new();
        let writer = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.send(21u32).await })
        };
        wait_for_writers(&channel, 1).await;
        let mut engine = seeded(8);

        let outcome =
            engine.evaluate(GuardSet::new().with(input_guard(|| true, &channel, |v: u32| v * 2)));

        let selection = outcome.selection().unwrap();
        assert_eq!(selection.output, 42);
        assert!(selection.received);
        assert!(writer.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn guards_sharing_a_source_take_one_value_per_attempt() {
        let channel = Channel::new();
        let writer = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.send('c').await })
        };
        wait_for_writers(&channel, 1).await;
        let received = Arc::new(AtomicUsize::new(0));
        let mut engine = seeded(9);

        let build = || {
            let first = Arc::clone(&received);
            let second = Arc::clone(&received);
            GuardSet::new()
                .with(input_guard(|| true, &channel, move |_: char| {
                    first.fetch_add(1, Ordering::SeqCst);
                }))
                .with(input_guard(|| true, &channel, move |_: char| {
                    second.fetch_add(1, Ordering::SeqCst);
                }))
        };

        assert!(engine.evaluate(build()).is_selected());
        assert!(engine.evaluate(build()).is_exhausted());
        assert_eq!(received.load(Ordering::SeqCst), 1);
        assert!(writer.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn blocking_waits_for_a_writer() {
        let channel = Channel::new();
        let writer = {
            let channel = channel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                channel.send(String::from("late")).await
            })
        };
        let mut engine = seeded(10);
        let cancel = CancellationToken::new();

        let outcome = engine
            .evaluate_blocking(
                GuardSet::new().with(input_guard(|| true, &channel, |line: String| line)),
                &cancel,
            )
            .await;

        assert_eq!(outcome.into_output().as_deref(), Some("late"));
        assert!(writer.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn blocking_on_dead_set_is_exhausted() {
        let channel: Channel<u8> = Channel::new();
        channel.close();
        let mut engine = seeded(11);
        let cancel = CancellationToken::new();

        let guards = GuardSet::new()
            .with(input_guard(|| true, &channel, |v: u8| v))
            .with(guard(|| false, || 0));
        let outcome = engine.evaluate_blocking(guards, &cancel).await;

        assert!(outcome.is_exhausted());
    }

    #[tokio::test]
    async fn blocking_wakes_when_source_closes() {
        let channel: Channel<u8> = Channel::new();
        let closer = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            closer.close();
        });
        let config = AlternationConfig::builder()
            .seed(12)
            .without_recheck()
            .build()
            .unwrap();
        let mut engine = Alternation::with_config(config).unwrap();
        let cancel = CancellationToken::new();

        let outcome = engine
            .evaluate_blocking(
                GuardSet::new().with(input_guard(|| true, &channel, |v: u8| v)),
                &cancel,
            )
            .await;

        assert!(outcome.is_exhausted());
    }

    #[tokio::test]
    async fn pre_cancelled_attempt_takes_nothing() {
        let channel = Channel::new();
        let writer = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.send(5u8).await })
        };
        wait_for_writers(&channel, 1).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut engine = seeded(13);

        let outcome = engine
            .evaluate_blocking(
                GuardSet::new().with(input_guard(|| true, &channel, |v: u8| v)),
                &cancel,
            )
            .await;

        assert!(outcome.is_cancelled());
        assert_eq!(channel.try_receive(), Ok(5));
        assert!(writer.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn deadline_turns_into_cancellation() {
        let channel: Channel<u8> = Channel::new();
        let config = AlternationConfig::builder()
            .seed(14)
            .deadline(Duration::from_millis(10))
            .build()
            .unwrap();
        let mut engine = Alternation::with_config(config).unwrap();

        let outcome = engine
            .evaluate_blocking(
                GuardSet::new().with(input_guard(|| true, &channel, |v: u8| v)),
                &CancellationToken::new(),
            )
            .await;

        assert!(outcome.is_cancelled());
    }

    #[tokio::test]
    async fn recheck_notices_precondition_changes() {
        let channel: Channel<u8> = Channel::new();
        let open = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&open);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(true, Ordering::SeqCst);
        });
        let config = AlternationConfig::builder()
            .seed(15)
            .recheck_interval(Duration::from_millis(2))
            .build()
            .unwrap();
        let mut engine = Alternation::with_config(config).unwrap();

        // The idle input keeps the set live while the flag is still down.
        let outcome = engine
            .evaluate_blocking(
                GuardSet::new()
                    .with(input_guard(|| true, &channel, |_: u8| "input"))
                    .with(guard(|| open.load(Ordering::SeqCst), || "flag")),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome.into_output(), Some("flag"));
    }
}
