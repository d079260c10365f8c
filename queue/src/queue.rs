//! The queue module is the in-memory heart of the system: an ordered list of [`Item`]s behind a
//! single lock, and the [`QueueCursor`] that hands that lock to a consumer.
//!
//! Dequeuing doesn't pop anything. It locks the queue, points a cursor at the next item, and
//! gives the cursor (still holding the lock) to the caller. The caller looks at the item and
//! decides what happens to it by calling exactly one of:
//!
//! - [`QueueCursor::commit`] removes the item for good
//! - [`QueueCursor::cancel`] leaves everything as it was
//! - [`QueueCursor::skip`] leaves the item in place but moves the start of the rotation past it
//!
//! Each of these consumes the cursor, and the lock goes with it. Dropping a cursor without
//! deciding anything is the same as `cancel`.
//!
//! Because producers and consumers share the one lock, nobody can enqueue while a cursor is out.
//! Keep the time between `dequeue` and the decision short.

use crate::{
    cancel::CancelToken,
    error::Result,
    item::Item,
};
use crossbeam_channel::{self, Sender, Receiver};
use derive_builder::Builder;
use getset::{CopyGetters, MutGetters};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// How many signals can pile up before we start dropping them.
pub const DEFAULT_SIGNAL_CAPACITY: usize = 24;

/// Tunables for a [`Queue`].
#[derive(Clone, Debug, Builder, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct QueueConfig {
    /// Capacity of the bounded channel used to send [`QueueEvent`]s to subscribers.
    #[builder(default = "DEFAULT_SIGNAL_CAPACITY")]
    signal_capacity: usize,
    /// How many items to allocate room for up front.
    #[builder(default = "0")]
    initial_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            signal_capacity: DEFAULT_SIGNAL_CAPACITY,
            initial_capacity: 0,
        }
    }
}

/// Counters describing what a queue has been up to.
#[derive(Clone, Debug, Default, CopyGetters, MutGetters, Serialize)]
#[getset(get_copy = "pub", get_mut)]
pub struct QueueMetrics {
    /// Number of items currently in the queue
    ready: u64,
    /// Number of items ever enqueued (including the initial load from storage)
    enqueued: u64,
    /// Number of items committed (removed)
    removed: u64,
    /// Number of times an item was skipped
    skipped: u64,
    /// Number of times a cursor was canceled
    released: u64,
    /// Number of active subscribers
    subscribers: u64,
}

/// Signals sent to subscribers when the queue changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueEvent {
    /// One or more items were added
    Enqueued,
    /// An item was committed and is gone
    Removed,
    /// An item was skipped, the rotation moved on
    Skipped,
    /// A cursor was canceled, the item is available again
    Released,
}

/// Everything that lives behind the queue's lock.
#[derive(Debug)]
struct QueueState {
    items: Vec<Item>,
    /// Where the next dequeue starts looking. Only guaranteed to be in bounds once `dequeue`
    /// has normalized it.
    cursor_start: usize,
    metrics: QueueMetrics,
}

impl QueueState {
    fn sync_ready(&mut self) {
        *self.metrics.ready_mut() = self.items.len() as u64;
    }
}

/// An in-memory FIFO (with deferral) of [`Item`]s that is safe to share across threads.
#[derive(Debug)]
pub struct Queue {
    state: Mutex<QueueState>,
    cancel: CancelToken,
    /// Handed out (cloned) to subscribers
    signal: Receiver<QueueEvent>,
    sender: Sender<QueueEvent>,
    subscribers: AtomicU64,
}

impl Queue {
    /// Create a new, empty `Queue` with its own cancellation token.
    pub fn new(config: QueueConfig) -> Self {
        Self::with_token(config, CancelToken::new())
    }

    /// Create a new, empty `Queue` that obeys the given (possibly shared) cancellation token.
    pub fn with_token(config: QueueConfig, cancel: CancelToken) -> Self {
        let (sender, signal) = crossbeam_channel::bounded(config.signal_capacity());
        let state = QueueState {
            items: Vec::with_capacity(config.initial_capacity()),
            cursor_start: 0,
            metrics: QueueMetrics::default(),
        };
        Self {
            state: Mutex::new(state),
            cancel,
            signal,
            sender,
            subscribers: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>> {
        Ok(self.state.lock()?)
    }

    /// Send a signal, if anyone is listening.
    fn event(&self, ev: QueueEvent) {
        if self.subscribers.load(Ordering::Acquire) == 0 {
            return;
        }
        if let Err(e) = self.sender.try_send(ev) {
            debug!("Queue::event() -- problem sending event, channel possibly full {:?}", e);
        }
    }

    /// Push an item onto the end of the queue.
    ///
    /// Fails with [`Error::Canceled`][crate::error::Error::Canceled] (without locking anything)
    /// once the queue's token has fired.
    pub fn enqueue(&self, item: Item) -> Result<()> {
        self.cancel.check()?;
        let mut state = self.lock()?;
        trace!("Queue::enqueue() -- push item {} at {}", item.id(), state.items.len());
        state.items.push(item);
        *state.metrics.enqueued_mut() += 1;
        state.sync_ready();
        self.event(QueueEvent::Enqueued);
        Ok(())
    }

    /// Push a batch of items onto the end of the queue under one lock, so nobody sees a
    /// half-loaded batch. This is how [`QueueWithStorage`][crate::persist::QueueWithStorage]
    /// hydrates itself from storage.
    pub fn enqueue_many<I>(&self, items: I) -> Result<()>
        where I: IntoIterator<Item = Item>,
    {
        self.cancel.check()?;
        let mut state = self.lock()?;
        let before = state.items.len();
        state.items.extend(items);
        let added = state.items.len() - before;
        trace!("Queue::enqueue_many() -- pushed {} items", added);
        *state.metrics.enqueued_mut() += added as u64;
        state.sync_ready();
        if added > 0 {
            self.event(QueueEvent::Enqueued);
        }
        Ok(())
    }

    /// Grab the next item in the rotation.
    ///
    /// Returns `Ok(None)` right away if the queue is empty; this never waits for items to show
    /// up (see [`Queue::subscribe`] for that). Otherwise the returned cursor *holds the queue's
    /// lock* until you commit, cancel, or skip it. Every other enqueue/dequeue on this queue
    /// blocks until then.
    pub fn dequeue(&self) -> Result<Option<QueueCursor<'_>>> {
        self.cancel.check()?;
        let mut state = self.lock()?;
        if state.items.is_empty() {
            return Ok(None);
        }
        if state.cursor_start >= state.items.len() {
            state.cursor_start = 0;
        }
        let position = state.cursor_start;
        trace!("Queue::dequeue() -- cursor at {} of {}", position, state.items.len());
        Ok(Some(QueueCursor {
            queue: self,
            state,
            position,
        }))
    }

    /// How many items are in the queue.
    ///
    /// This takes the queue's lock: calling it while the same thread holds a cursor on this
    /// queue will deadlock.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.items.len())
    }

    /// See [`Queue::len`] for the locking caveat.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Get a snapshot of the queue's counters. Same locking caveat as [`Queue::len`].
    pub fn metrics(&self) -> Result<QueueMetrics> {
        let mut metrics = self.lock()?.metrics.clone();
        *metrics.subscribers_mut() = self.subscribers.load(Ordering::Acquire);
        Ok(metrics)
    }

    /// Copy out every item, in insertion order. Same locking caveat as [`Queue::len`].
    pub fn snapshot(&self) -> Result<Vec<Item>> {
        Ok(self.lock()?.items.clone())
    }

    /// Get a handle on this queue's cancellation token.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Fire this queue's cancellation token. All future enqueues and dequeues fail with
    /// [`Error::Canceled`][crate::error::Error::Canceled]. A cursor that's already out can
    /// still be resolved normally.
    pub fn cancel(&self) {
        debug!("Queue::cancel() -- canceling queue");
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Subscribe to this queue. This returns a crossbeam channel that notifies listeners when
    /// things happen, which is handy for waiting on an empty queue instead of spinning.
    ///
    /// All subscribers share one bounded channel, so each event goes to one of them.
    pub fn subscribe(&self) -> Receiver<QueueEvent> {
        self.subscribers.fetch_add(1, Ordering::AcqRel);
        self.signal.clone()
    }

    /// Unsubscribe from this queue.
    pub fn unsubscribe(&self, signal: Receiver<QueueEvent>) {
        // saturate rather than wrap if someone unsubscribes a receiver twice
        let _ = self.subscribers.fetch_update(Ordering::AcqRel, Ordering::Acquire, |x| x.checked_sub(1));
        drop(signal)
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

/// Exclusive access to one item in a [`Queue`], created by [`Queue::dequeue`].
///
/// The cursor owns the queue's lock. It goes away, and the lock with it, through exactly one of
/// [`commit`](Self::commit), [`cancel`](Self::cancel), or [`skip`](Self::skip). Dropping it
/// without calling any of them releases the lock without changing anything.
#[derive(Debug)]
#[must_use = "a cursor holds the queue's lock until it is committed, canceled, or skipped"]
pub struct QueueCursor<'q> {
    queue: &'q Queue,
    state: MutexGuard<'q, QueueState>,
    position: usize,
}

impl<'q> QueueCursor<'q> {
    /// The item under the cursor.
    pub fn item(&self) -> &Item {
        // dequeue never builds a cursor past the end and nothing can change the list while we
        // hold the guard
        &self.state.items[self.position]
    }

    /// Where in the queue the item lives.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Remove the item from the queue and release the lock.
    ///
    /// Everything after the item shifts down a slot while the queue's start position stays put,
    /// so the next dequeue lands on whatever came after the removed item.
    pub fn commit(mut self) -> Item {
        let item = self.state.items.remove(self.position);
        trace!("QueueCursor::commit() -- removed item {} at {}", item.id(), self.position);
        *self.state.metrics.removed_mut() += 1;
        self.state.sync_ready();
        self.queue.event(QueueEvent::Removed);
        item
    }

    /// Release the lock without touching anything. The next dequeue sees the same item.
    pub fn cancel(mut self) {
        trace!("QueueCursor::cancel() -- release item at {}", self.position);
        *self.state.metrics.released_mut() += 1;
        self.queue.event(QueueEvent::Released);
    }

    /// Move the start of the rotation past this item (wrapping back to the front from the last
    /// slot) and release the lock. The item stays in the queue and comes around again after
    /// everything behind it.
    pub fn skip(mut self) {
        let len = self.state.items.len();
        let next = self.state.cursor_start + 1;
        self.state.cursor_start = if next < len { next } else { 0 };
        trace!("QueueCursor::skip() -- skip item at {}, next start {}", self.position, self.state.cursor_start);
        *self.state.metrics.skipped_mut() += 1;
        self.queue.event(QueueEvent::Skipped);
    }
}
