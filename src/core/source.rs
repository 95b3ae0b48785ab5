//! Synchronous input sources for guards.
//!
//! An input source is the `source?var` half of a CSP input command. The
//! engine only talks to sources through the [`InputSource`] trait; the
//! crate ships one implementation, the unbuffered [`Channel`], where a
//! value changes hands only when a writer and a reader meet.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tracing::{debug, trace};
use uuid::Uuid;

/// Stable identity of an input source.
///
/// Guards that read the same source share its id, which is how the engine
/// limits a source to one candidate per alternation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(Uuid);

impl SourceId {
    /// Allocate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Readiness of a source as seen by a reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStatus {
    /// Open, but no writer is waiting.
    Idle,
    /// Open, and at least one writer is waiting to hand over a value.
    WriterWaiting,
    /// Permanently closed. Reads fail immediately.
    Closed,
}

impl SourceStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// A value could be taken right now.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::WriterWaiting)
    }
}

/// Why a non-blocking read produced no value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TryReceiveError {
    #[error("no writer is waiting on the source")]
    Empty,

    #[error("source is closed")]
    Closed,
}

/// A write was attempted on a closed source.
///
/// The rejected value is handed back so the writer can decide what to do
/// with it.
#[derive(Error)]
#[error("write to closed input source {source_id}")]
pub struct ClosedSourceError<T> {
    pub source_id: SourceId,
    pub value: T,
}

impl<T> ClosedSourceError<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for ClosedSourceError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosedSourceError")
            .field("source_id", &self.source_id)
            .finish_non_exhaustive()
    }
}

/// A readable, closable source of values for input guards.
///
/// Implementations must make `close` one-way and idempotent, and must make
/// a close visible to every later `status`/`try_receive` call from any task.
pub trait InputSource: Send + Sync {
    type Item: Send;

    fn id(&self) -> SourceId;

    /// Current readiness. Never blocks.
    fn status(&self) -> SourceStatus;

    /// Take a value if a writer is waiting right now. Never blocks.
    fn try_receive(&self) -> Result<Self::Item, TryReceiveError>;

    /// Close the source permanently.
    fn close(&self);

    fn is_closed(&self) -> bool {
        self.status().is_closed()
    }

    /// Change notifications.
    ///
    /// The returned receiver observes a new value whenever the source may
    /// have become ready or closed. A blocked alternation subscribes before
    /// probing so no transition is missed.
    fn watch(&self) -> watch::Receiver<u64>;
}

struct Offer<T> {
    ticket: u64,
    value: T,
    reply: oneshot::Sender<Result<(), T>>,
}

struct Pending<T> {
    offers: VecDeque<Offer<T>>,
    closed: bool,
    next_ticket: u64,
}

struct Shared<T> {
    id: SourceId,
    pending: Mutex<Pending<T>>,
    signal: watch::Sender<u64>,
}

impl<T> Shared<T> {
    // Critical sections never panic, so a poisoned lock still holds
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, Pending<T>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.signal.send_modify(|version| *version = version.wrapping_add(1));
    }
}

/// Unbuffered rendezvous channel.
///
/// `send` suspends until a reader takes the value; `try_receive` takes a
/// value only if a writer is already waiting. Handles are cheap to clone
/// and all clones share one channel.
///
/// # Example
///
/// ```rust
/// use guarded::core::{Channel, InputSource, TryReceiveError};
///
/// let channel: Channel<u32> = Channel::new();
///
/// // Nobody is writing, so a non-blocking read comes back empty.
/// assert_eq!(channel.try_receive(), Err(TryReceiveError::Empty));
///
/// channel.close();
/// assert!(channel.is_closed());
/// assert_eq!(channel.try_receive(), Err(TryReceiveError::Closed));
/// ```
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                id: SourceId::new(),
                pending: Mutex::new(Pending {
                    offers: VecDeque::new(),
                    closed: false,
                    next_ticket: 0,
                }),
                signal,
            }),
        }
    }

    /// Hand `value` to a reader, waiting until one takes it.
    ///
    /// Fails fast with [`ClosedSourceError`] if the channel is closed, and
    /// also if it closes while this writer is waiting; the value comes back
    /// in the error either way. Dropping the future before a reader arrives
    /// withdraws the offer.
    pub async fn send(&self, value: T) -> Result<(), ClosedSourceError<T>> {
        let (reply, taken) = oneshot::channel();
        let ticket = {
            let mut pending = self.shared.lock();
            if pending.closed {
                debug!(source = %self.shared.id, "write rejected by closed source");
                return Err(ClosedSourceError {
                    source_id: self.shared.id,
                    value,
                });
            }
            let ticket = pending.next_ticket;
            pending.next_ticket += 1;
            pending.offers.push_back(Offer {
                ticket,
                value,
                reply,
            });
            ticket
        };
        trace!(source = %self.shared.id, ticket, "writer waiting");
        self.shared.notify();

        let mut withdraw = Withdraw {
            shared: &self.shared,
            ticket,
            armed: true,
        };
        let answer = taken.await;
        withdraw.armed = false;

        match answer {
            Ok(Ok(())) => Ok(()),
            Ok(Err(value)) => Err(ClosedSourceError {
                source_id: self.shared.id,
                value,
            }),
            // The reply is only dropped unanswered after a reader removed
            // the offer from the queue, so the value was delivered.
            Err(_) => Ok(()),
        }
    }

    /// Blocking read: wait for a writer and take its value.
    ///
    /// Returns `None` once the channel is closed.
    pub async fn receive(&self) -> Option<T>
    where
        T: Send,
    {
        let mut changes = self.shared.signal.subscribe();
        loop {
            match self.try_receive() {
                Ok(value) => return Some(value),
                Err(TryReceiveError::Closed) => return None,
                Err(TryReceiveError::Empty) => {}
            }
            if changes.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Number of writers currently waiting.
    pub fn waiting_writers(&self) -> usize {
        self.shared.lock().offers.len()
    }
}

impl<T: Send> InputSource for Channel<T> {
    type Item = T;

    fn id(&self) -> SourceId {
        self.shared.id
    }

    fn status(&self) -> SourceStatus {
        let pending = self.shared.lock();
        if pending.closed {
            SourceStatus::Closed
        } else if pending.offers.is_empty() {
            SourceStatus::Idle
        } else {
            SourceStatus::WriterWaiting
        }
    }

    fn try_receive(&self) -> Result<T, TryReceiveError> {
        let offer = {
            let mut pending = self.shared.lock();
            if pending.closed {
                return Err(TryReceiveError::Closed);
            }
            pending.offers.pop_front().ok_or(TryReceiveError::Empty)?
        };
        trace!(source = %self.shared.id, ticket = offer.ticket, "offer taken");
        // The writer may have given up already; the value is ours either way.
        let _ = offer.reply.send(Ok(()));
        Ok(offer.value)
    }

    fn close(&self) {
        let returned = {
            let mut pending = self.shared.lock();
            if pending.closed {
                return;
            }
            pending.closed = true;
            std::mem::take(&mut pending.offers)
        };
        debug!(source = %self.shared.id, returned = returned.len(), "input source closed");
        for offer in returned {
            let _ = offer.reply.send(Err(offer.value));
        }
        self.shared.notify();
    }

    fn watch(&self) -> watch::Receiver<u64> {
        self.shared.signal.subscribe()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.shared.lock();
        f.debug_struct("Channel")
            .field("id", &self.shared.id)
            .field("waiting_writers", &pending.offers.len())
            .field("closed", &pending.closed)
            .finish()
    }
}

/// Pulls a writer's offer back out of the queue if its `send` is dropped
/// before a reader or a close answered it.
struct Withdraw<'c, T> {
    shared: &'c Shared<T>,
    ticket: u64,
    armed: bool,
}

impl<T> Drop for Withdraw<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut pending = self.shared.lock();
        let before = pending.offers.len();
        pending.offers.retain(|offer| offer.ticket != self.ticket);
        if pending.offers.len() != before {
            trace!(source = %self.shared.id, ticket = self.ticket, "offer withdrawn");
        }
    }
}
