//! The storage contract a [`QueueWithStorage`][crate::persist::QueueWithStorage] leans on, plus
//! the implementations that ship with this crate.
//!
//! A queue never assumes anything about its storage beyond these three operations. In
//! particular, memory and storage are not updated atomically together: the queue only promises
//! that storage is written before memory on the way in and deleted from before memory on the
//! way out.

pub mod disk;
pub mod memory;

use crate::{
    error::Result,
    item::{Item, ItemID},
};
use std::sync::Arc;

pub use disk::SledStore;
pub use memory::MemoryStore;

/// The `Storage` trait defines an interface for our storage systems.
pub trait Storage: Send + Sync {
    /// Persist an item, returning the unique ID it now lives under. The item's own `id` is
    /// ignored.
    fn insert(&self, item: &Item) -> Result<ItemID>;

    /// Get every persisted item, ordered by ID. Used once when a queue starts up.
    fn get_all(&self) -> Result<Vec<Item>>;

    /// Delete a persisted item. Returns [`Error::ItemNotFound`][crate::error::Error::ItemNotFound]
    /// if there's no such ID.
    fn delete(&self, id: ItemID) -> Result<()>;
}

// these let a queue borrow or share a storage layer the caller keeps ownership of

impl<T: Storage + ?Sized> Storage for &T {
    fn insert(&self, item: &Item) -> Result<ItemID> {
        (**self).insert(item)
    }

    fn get_all(&self) -> Result<Vec<Item>> {
        (**self).get_all()
    }

    fn delete(&self, id: ItemID) -> Result<()> {
        (**self).delete(id)
    }
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn insert(&self, item: &Item) -> Result<ItemID> {
        (**self).insert(item)
    }

    fn get_all(&self) -> Result<Vec<Item>> {
        (**self).get_all()
    }

    fn delete(&self, id: ItemID) -> Result<()> {
        (**self).delete(id)
    }
}
