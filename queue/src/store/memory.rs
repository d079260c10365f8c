//! This module holds our in-memory storage implementation. Nothing survives the process, which
//! makes it good for tests and not much else.

use ahash::RandomState;
use crate::{
    error::{Error, Result},
    item::{Item, ItemID},
    store::Storage,
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::trace;

/// A storage layer that lives entirely in-memory.
#[derive(Debug)]
pub struct MemoryStore {
    next_id: AtomicI64,
    data: DashMap<ItemID, Vec<u8>, RandomState>,
}

impl MemoryStore {
    /// Create a new, empty store. IDs start at 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            data: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Generate a new unique sequential ID.
    fn gen_id(&self) -> ItemID {
        ItemID::from(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// How many items are stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, id: ItemID) -> bool {
        self.data.contains_key(&id)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStore {
    fn insert(&self, item: &Item) -> Result<ItemID> {
        let id = self.gen_id();
        trace!("MemoryStore::insert() -- insert item {}", id);
        self.data.insert(id, item.payload().clone());
        Ok(id)
    }

    fn get_all(&self) -> Result<Vec<Item>> {
        let mut items = self.data.iter()
            .map(|x| Item::new(*x.key(), x.value().clone()))
            .collect::<Vec<_>>();
        items.sort_by_key(|x| x.id());
        Ok(items)
    }

    fn delete(&self, id: ItemID) -> Result<()> {
        trace!("MemoryStore::delete() -- delete item {}", id);
        self.data.remove(&id)
            .map(|_| ())
            .ok_or(Error::ItemNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::{Arc, RwLock};

    #[test]
    fn generates_ids() {
        let store = Arc::new(MemoryStore::new());
        let id_dumpster = Arc::new(RwLock::new(BTreeSet::new()));
        let mut handles = Vec::new();

        for i in 0..8 {
            let local_store = store.clone();
            let ids = id_dumpster.clone();
            handles.push(std::thread::spawn(move || {
                for x in 0..5 {
                    let new_id = local_store.insert(&Item::from_payload(format!("{}-{}", i, x))).unwrap();
                    let mut handle = ids.write().unwrap();
                    (*handle).insert(*new_id);
                }
            }));
        }

        for handle in handles { handle.join().unwrap(); }
        let id_list = {
            let handle = id_dumpster.read().unwrap();
            (*handle).iter().copied().collect::<Vec<_>>()
        };
        assert_eq!(id_list, (1..=40).collect::<Vec<_>>());
        assert_eq!(store.len(), 40);
    }

    #[test]
    fn get_all_is_ordered() {
        let store = MemoryStore::new();
        for name in ["one", "two", "three", "four"] {
            store.insert(&Item::from_payload(name)).unwrap();
        }
        store.delete(ItemID::from(2)).unwrap();
        let items = store.get_all().unwrap();
        assert_eq!(items.iter().map(|x| *x.id()).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(items[1].payload(), &Vec::from("three".as_bytes()));
    }

    #[test]
    fn delete_missing() {
        let store = MemoryStore::new();
        let id = store.insert(&Item::from_payload("here today")).unwrap();
        store.delete(id).unwrap();
        assert!(!store.contains(id));
        assert!(matches!(store.delete(id), Err(Error::ItemNotFound(x)) if x == id));
        assert!(store.is_empty());
    }

    #[test]
    fn ignores_incoming_id() {
        let store = MemoryStore::new();
        let id = store.insert(&Item::new(ItemID::from(9000), "over nine thousand")).unwrap();
        assert_eq!(id, ItemID::from(1));
    }
}
