//! A [`Queue`] that keeps a [`Storage`] layer in step with its in-memory items.
//!
//! [`QueueWithStorage`] adds its own lock on top of the inner queue's. It is always taken first
//! and released last, and it's held across the storage call *and* the memory change so the two
//! can't interleave with another producer or consumer. Storage always moves first: an item is
//! persisted before it shows up in memory and deleted from storage before it leaves memory.
//!
//! If the storage delete fails during a commit, the item stays in memory and in storage and
//! both locks are released. From the caller's point of view a failed commit is a cancel: the
//! same item comes back on a later dequeue, so retry by dequeuing again.

use crate::{
    cancel::CancelToken,
    error::Result,
    item::{Item, ItemID},
    queue::{Queue, QueueConfig, QueueCursor, QueueEvent, QueueMetrics},
    store::Storage,
};
use crossbeam_channel::Receiver;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// A [`Queue`] with a [`Storage`] layer behind it. Items are persisted before they're queued
/// and deleted from storage before a commit removes them from memory.
///
/// Dequeuing hands out a [`QueueStorageCursor`], which holds this queue's lock *and* the inner
/// queue's lock until it's resolved.
#[derive(Debug)]
pub struct QueueWithStorage<S> {
    /// Serializes storage+memory sequences. Always acquired before the inner queue's lock.
    lock: Mutex<()>,
    queue: Queue,
    storage: S,
}

impl<S: Storage> QueueWithStorage<S> {
    /// Create a new queue on top of `storage`, loading everything already in storage into
    /// memory (in ID order). If the load fails, so does this.
    ///
    /// Pass `&MyStorage` or `Arc<MyStorage>` to keep ownership of the storage yourself.
    pub fn new(config: QueueConfig, storage: S) -> Result<Self> {
        Self::with_token(config, storage, CancelToken::new())
    }

    /// Like [`QueueWithStorage::new`], but obeying the given (possibly shared) cancellation
    /// token.
    pub fn with_token(config: QueueConfig, storage: S, cancel: CancelToken) -> Result<Self> {
        let queue = Queue::with_token(config, cancel);
        let items = storage.get_all()?;
        debug!("QueueWithStorage::new() -- loading {} items from storage", items.len());
        queue.enqueue_many(items)?;
        Ok(Self {
            lock: Mutex::new(()),
            queue,
            storage,
        })
    }

    /// Persist the item, then add it to the in-memory queue with the ID storage handed back.
    ///
    /// The item's own `id` is overwritten. If storage fails, memory is left alone. A canceled
    /// queue fails before storage is touched.
    pub fn enqueue(&self, mut item: Item) -> Result<ItemID> {
        self.queue.cancel_token().check()?;
        let _guard = self.lock.lock()?;
        let id = self.storage.insert(&item)?;
        *item.id_mut() = id;
        self.queue.enqueue(item)?;
        Ok(id)
    }

    /// Grab the next item in the rotation. Works like [`Queue::dequeue`], except the returned
    /// cursor holds *both* locks until it's resolved.
    pub fn dequeue(&self) -> Result<Option<QueueStorageCursor<'_, S>>> {
        // a canceled queue fails right away, even if a cursor is out and holding the lock
        self.queue.cancel_token().check()?;
        let outer = self.lock.lock()?;
        // on error or empty, `outer` drops on the way out and the lock goes with it
        let inner = match self.queue.dequeue()? {
            Some(inner) => inner,
            None => return Ok(None),
        };
        Ok(Some(QueueStorageCursor {
            inner,
            storage: &self.storage,
            _outer: outer,
        }))
    }

    /// The in-memory queue. Anything done to it directly bypasses storage.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// See [`Queue::len`], including the locking caveat.
    pub fn len(&self) -> Result<usize> {
        self.queue.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.queue.is_empty()
    }

    pub fn metrics(&self) -> Result<QueueMetrics> {
        self.queue.metrics()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.queue.cancel_token()
    }

    pub fn cancel(&self) {
        self.queue.cancel()
    }

    pub fn is_canceled(&self) -> bool {
        self.queue.is_canceled()
    }

    pub fn subscribe(&self) -> Receiver<QueueEvent> {
        self.queue.subscribe()
    }

    pub fn unsubscribe(&self, signal: Receiver<QueueEvent>) {
        self.queue.unsubscribe(signal)
    }
}

/// The storage-aware version of [`QueueCursor`], created by [`QueueWithStorage::dequeue`].
///
/// Holds the outer lock on top of the inner cursor's. Every way out resolves the inner cursor
/// first and then lets go of the outer lock.
#[derive(Debug)]
#[must_use = "a cursor holds the queue's locks until it is committed, canceled, or skipped"]
pub struct QueueStorageCursor<'q, S> {
    // field order matters: on drop the inner cursor (and its lock) goes before the outer lock
    inner: QueueCursor<'q>,
    storage: &'q S,
    _outer: MutexGuard<'q, ()>,
}

impl<'q, S: Storage> QueueStorageCursor<'q, S> {
    pub fn item(&self) -> &Item {
        self.inner.item()
    }

    pub fn position(&self) -> usize {
        self.inner.position()
    }

    /// Delete the item from storage, then from memory, and release both locks.
    ///
    /// If the storage delete fails, nothing is removed anywhere, both locks are released, and
    /// the error comes back. The item will show up again on a later dequeue.
    pub fn commit(self) -> Result<Item> {
        let Self { inner, storage, _outer: outer } = self;
        let id = inner.item().id();
        let res = match storage.delete(id) {
            Ok(()) => Ok(inner.commit()),
            Err(e) => {
                warn!("QueueStorageCursor::commit() -- error deleting item {} from storage, leaving it queued: {}", id, e);
                inner.cancel();
                Err(e)
            }
        };
        drop(outer);
        res
    }

    /// Release both locks without touching anything.
    pub fn cancel(self) {
        let Self { inner, _outer: outer, .. } = self;
        inner.cancel();
        drop(outer);
    }

    /// Skip the item (see [`QueueCursor::skip`]) and release both locks. Storage isn't
    /// involved: skipping only changes the in-memory rotation.
    pub fn skip(self) {
        let Self { inner, _outer: outer, .. } = self;
        inner.skip();
        drop(outer);
    }
}
