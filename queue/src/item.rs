//! The item module holds the one thing every queue in this crate passes around: an [`Item`],
//! which is an opaque payload plus the id the storage layer gave it.
//!
//! Payloads are never looked at by the queue. Serializing whatever the caller wants to put in
//! there is the caller's business.

use getset::{CopyGetters, Getters, MutGetters};
use serde::{Serialize, Deserialize};
use std::ops::Deref;

macro_rules! wrapper_primitive {
    ($(#[$attr:meta])* $name:ident, $ty:ty) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name($ty);

        impl From<$ty> for $name {
            fn from(val: $ty) -> Self {
                Self(val)
            }
        }

        impl Deref for $name {
            type Target = $ty;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    }
}

wrapper_primitive! {
    /// Represents an item's unique ID. Assigned by the storage layer when persistence is in
    /// play, otherwise whatever the producer set (or the default, 0).
    ItemID, i64
}

/// Represents an item of work sitting in a queue.
#[derive(Clone, Debug, Default, PartialEq, Eq, CopyGetters, Getters, MutGetters, Serialize, Deserialize)]
pub struct Item {
    /// The item's unique ID
    #[getset(get_copy = "pub", get_mut = "pub(crate)")]
    id: ItemID,
    /// The item's data payload
    #[getset(get = "pub")]
    payload: Vec<u8>,
}

impl Item {
    /// Create a new item.
    pub fn new<I, P>(id: I, payload: P) -> Self
        where I: Into<ItemID>,
              P: Into<Vec<u8>>,
    {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }

    /// Create an item with no id yet. Use this when enqueuing into a
    /// [`QueueWithStorage`][crate::persist::QueueWithStorage], which will get an id from its
    /// storage layer.
    pub fn from_payload<P: Into<Vec<u8>>>(payload: P) -> Self {
        Self::new(ItemID::default(), payload)
    }

    /// Take an id and a stored record and put the item back together.
    pub(crate) fn create_from_parts(id: ItemID, store: ItemStore) -> Self {
        let ItemStore { payload } = store;
        Self::new(id, payload)
    }
}

/// A struct made specifically for storing items in our storage layer. The id is the key, so
/// it doesn't get repeated in the value.
#[derive(Clone, Debug, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct ItemStore {
    pub(crate) payload: Vec<u8>,
}

impl From<&Item> for ItemStore {
    fn from(item: &Item) -> Self {
        Self {
            payload: item.payload.clone(),
        }
    }
}
