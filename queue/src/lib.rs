//! The queue library is responsible for all queue operations: enqueuing, dequeuing, and deciding
//! what happens to a dequeued item (commit, cancel, or skip). It is also responsible for keeping
//! an optional storage layer in step with what's in memory.
//!
//! The queues are safe to be used across multiple threads. All operations are synchronous: they
//! block on a lock at most, and an empty queue returns right away instead of waiting.
//!
//! The central rule: a dequeue that hands you a cursor also hands you the queue's lock, and the
//! only way to give it back is to resolve the cursor (or drop it).
//!
//! ```
//! use turnstile_queue::{item::Item, persist::QueueWithStorage, queue::QueueConfig, store::MemoryStore};
//!
//! let store = MemoryStore::new();
//! let queue = QueueWithStorage::new(QueueConfig::default(), &store).unwrap();
//! queue.enqueue(Item::from_payload("wash the dishes")).unwrap();
//! if let Some(cursor) = queue.dequeue().unwrap() {
//!     assert_eq!(cursor.item().payload(), b"wash the dishes");
//!     cursor.commit().unwrap();
//! }
//! assert!(store.is_empty());
//! ```

pub mod cancel;
pub mod error;
pub mod item;
pub mod persist;
pub mod queue;
pub mod store;
mod ser;

pub use crossbeam_channel;
pub use sled;
