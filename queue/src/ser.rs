use bincode::{
    DefaultOptions,
    Options,
    config::{BigEndian, FixintEncoding, WithOtherEndian, WithOtherIntEncoding},
};
use crate::{
    error::Result,
};
use serde::{
    de::Deserialize,
    ser::Serialize,
};

/// The encoding we use for everything that goes into sled.
type SortableOptions = WithOtherIntEncoding<WithOtherEndian<DefaultOptions, BigEndian>, FixintEncoding>;

fn options() -> SortableOptions {
    DefaultOptions::new()
        // big endian makes i64 ids properly sortable by sled
        .with_big_endian()
        // fixed length encoding keeps every key the same width, also for sorting
        .with_fixint_encoding()
}

/// Serialize a value into a byte vector
pub(crate) fn serialize<T: Serialize>(val: &T) -> Result<Vec<u8>> {
    Ok(options().serialize(val)?)
}

/// Deserialize a value from a byte slice
pub(crate) fn deserialize<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    Ok(options().deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        item::{Item, ItemID, ItemStore},
    };

    #[test]
    fn keys_sort_like_ids() {
        let ids = [1i64, 2, 255, 256, 70_000, 1 << 40];
        let keys = ids.iter()
            .map(|x| serialize(&ItemID::from(*x)).unwrap())
            .collect::<Vec<_>>();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(keys.iter().all(|x| x.len() == 8));
        assert_eq!(deserialize::<ItemID>(&keys[3]).unwrap(), ItemID::from(256));
    }

    #[test]
    fn store_records_and_bad_bytes() {
        let item = Item::new(ItemID::from(3), "a payload");
        let bytes = serialize(&ItemStore::from(&item)).unwrap();
        let store = deserialize::<ItemStore>(&bytes).unwrap();
        assert_eq!(store.payload(), item.payload());

        // a truncated key can't be an id
        assert!(matches!(deserialize::<ItemID>(&[0, 1, 2]), Err(Error::Serde(_))));
    }
}
