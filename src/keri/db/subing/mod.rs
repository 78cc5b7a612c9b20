pub mod cesr;
pub mod serder;
pub mod signer;

use crate::errors::MatterError;
use crate::keri::db::dbing::{BytesDatabase, LMDBer};
use crate::keri::db::errors::DBError;
use std::sync::Arc;

/// Errors from the typed sub store wrappers
#[derive(Debug, thiserror::Error)]
pub enum SuberError {
    #[error("Database error: {0}")]
    DBError(#[from] DBError),

    #[error("Matter error: {0}")]
    MatterError(#[from] MatterError),

    #[error("Value conversion error: {0}")]
    ValueConversionError(String),

    #[error("Empty keys")]
    EmptyKeys,
}

/// Base of all typed sub stores: one named sub database with composite
/// keys joined by a separator byte.
pub struct SuberBase<'db> {
    db: Arc<&'db LMDBer>,
    sdb: BytesDatabase,
    sep: u8,
}

impl<'db> SuberBase<'db> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        let sdb = db.create_database(subkey)?;

        Ok(Self {
            db,
            sdb,
            sep: sep.unwrap_or(b'.'),
        })
    }

    /// Join ordered key fragments with the separator into one byte key.
    /// A single fragment passes through unchanged.
    pub fn tokey<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<u8>, SuberError> {
        if keys.is_empty() {
            return Err(SuberError::EmptyKeys);
        }

        let mut key = Vec::new();
        for (i, fragment) in keys.iter().enumerate() {
            if i > 0 {
                key.push(self.sep);
            }
            key.extend_from_slice(fragment.as_ref());
        }

        Ok(key)
    }

    pub fn put_bytes<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        Ok(self.db.put_val(&self.sdb, &self.tokey(keys)?, val)?)
    }

    pub fn pin_bytes<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        Ok(self.db.set_val(&self.sdb, &self.tokey(keys)?, val)?)
    }

    pub fn update_bytes<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        Ok(self.db.update_val(&self.sdb, &self.tokey(keys)?, val)?)
    }

    pub fn get_bytes<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<Vec<u8>>, SuberError> {
        Ok(self.db.get_val(&self.sdb, &self.tokey(keys)?)?)
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        Ok(self.db.del_val(&self.sdb, &self.tokey(keys)?)?)
    }

    pub fn cnt_all(&self) -> Result<u64, SuberError> {
        Ok(self.db.cnt(&self.sdb)?)
    }

    /// All items in key order as (key, value) byte pairs.
    pub fn get_item_iter(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, SuberError> {
        Ok(self.db.get_top_items(&self.sdb, b"")?)
    }
}

/// Suber stores raw byte values under composite keys.
pub struct Suber<'db> {
    base: SuberBase<'db>,
}

impl<'db> Suber<'db> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep)?,
        })
    }

    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        self.base.put_bytes(keys, val)
    }

    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        self.base.pin_bytes(keys, val)
    }

    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<Vec<u8>>, SuberError> {
        self.base.get_bytes(keys)
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        self.base.rem(keys)
    }

    pub fn cnt_all(&self) -> Result<u64, SuberError> {
        self.base.cnt_all()
    }

    pub fn get_item_iter(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, SuberError> {
        self.base.get_item_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suber_raw_round_trip() {
        let lmdber = LMDBer::builder()
            .name("test_suber")
            .temp(true)
            .build()
            .unwrap();
        let suber = Suber::new(Arc::new(&lmdber), "docs.", None).unwrap();

        assert!(suber.put(&["key"], b"value").unwrap());
        assert_eq!(suber.get(&["key"]).unwrap().unwrap(), b"value");

        assert!(!suber.put(&["key"], b"other").unwrap());
        assert!(suber.pin(&["key"], b"other").unwrap());
        assert_eq!(suber.get(&["key"]).unwrap().unwrap(), b"other");

        assert!(suber.rem(&["key"]).unwrap());
        assert!(suber.get(&["key"]).unwrap().is_none());
    }

    #[test]
    fn test_suber_composite_keys() {
        let lmdber = LMDBer::builder()
            .name("test_suber_keys")
            .temp(true)
            .build()
            .unwrap();
        let suber = Suber::new(Arc::new(&lmdber), "docs.", None).unwrap();

        suber.put(&["a", "b"], b"joined").unwrap();
        // Composite fragments join with '.' into one flat key
        assert_eq!(suber.get(&["a.b"]).unwrap().unwrap(), b"joined");

        let items = suber.get_item_iter().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0, b"a.b");

        let empty: [&[u8]; 0] = [];
        assert!(matches!(
            suber.get(&empty),
            Err(SuberError::EmptyKeys)
        ));
    }
}
