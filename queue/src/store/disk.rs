//! A [`Storage`] implementation on top of [`sled`]. Items are keyed by their ID (serialized
//! big-endian, so sled's key order is ID order) and the value is an [`ItemStore`].

use crate::{
    error::{Error, Result},
    item::{Item, ItemID, ItemStore},
    ser,
    store::Storage,
};
use getset::Getters;
use sled::Db;
use std::path::Path;
use tracing::trace;

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Create a new `SledStore` from an already-open [`sled::Db`].
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Open (or create) a store at the given location.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::Config::default()
            .path(path)
            .mode(sled::Mode::HighThroughput)
            .open()?;
        Ok(Self::new(db))
    }

    /// Open a store that gets thrown away when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::default()
            .mode(sled::Mode::HighThroughput)
            .temporary(true)
            .open()?;
        Ok(Self::new(db))
    }

    /// Push everything to disk, returning the number of bytes flushed.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db().flush()?)
    }

    fn gen_id(&self) -> Result<ItemID> {
        // sled starts at 0, we want our ids to start at 1 like the in-memory store
        let raw = self.db().generate_id()?;
        raw.checked_add(1)
            .and_then(|x| i64::try_from(x).ok())
            .map(ItemID::from)
            .ok_or_else(|| Error::StoreIDError(format!("generated id {} does not fit an item id", raw)))
    }
}

impl Storage for SledStore {
    fn insert(&self, item: &Item) -> Result<ItemID> {
        let id = self.gen_id()?;
        trace!("SledStore::insert() -- insert item {}", id);
        self.db().insert(ser::serialize(&id)?, ser::serialize(&ItemStore::from(item))?)?;
        Ok(id)
    }

    fn get_all(&self) -> Result<Vec<Item>> {
        self.db().iter()
            .map(|entry| -> Result<Item> {
                let (key, val) = entry?;
                let id = ser::deserialize::<ItemID>(key.as_ref())?;
                let store = ser::deserialize::<ItemStore>(val.as_ref())?;
                Ok(Item::create_from_parts(id, store))
            })
            .collect()
    }

    fn delete(&self, id: ItemID) -> Result<()> {
        trace!("SledStore::delete() -- delete item {}", id);
        self.db().remove(ser::serialize(&id)?)?
            .map(|_| ())
            .ok_or(Error::ItemNotFound(id))
    }
}
