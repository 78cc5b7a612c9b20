use crate::keri::db::dbing::{BytesDatabase, LMDBer};
use crate::keri::db::errors::DBError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Serialization kinds for keyed object stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialKind {
    Json,
    Mgpk,
    Cbor,
}

/// Komer is a keyed object store over one named sub database. Values are
/// serde records serialized under the configured kind. JSON output is
/// compact with struct order keys; deserialization overlays present
/// fields onto defaults for forward compatibility.
pub struct Komer<'db, T: Serialize + DeserializeOwned> {
    db: Arc<&'db LMDBer>,
    sdb: BytesDatabase,
    kind: SerialKind,
    sep: u8,
    _marker: PhantomData<T>,
}

impl<'db, T: Serialize + DeserializeOwned> Komer<'db, T> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, kind: SerialKind) -> Result<Self, DBError> {
        let sdb = db.create_database(subkey)?;

        Ok(Self {
            db,
            sdb,
            kind,
            sep: b'.',
            _marker: PhantomData,
        })
    }

    fn tokey<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<u8>, DBError> {
        if keys.is_empty() {
            return Err(DBError::KeyError("Empty keys.".to_string()));
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

    fn serialize(&self, val: &T) -> Result<Vec<u8>, DBError> {
        match self.kind {
            SerialKind::Json => serde_json::to_vec(val)
                .map_err(|e| DBError::ValueError(format!("JSON serialize: {}", e))),
            SerialKind::Mgpk => rmp_serde::to_vec_named(val)
                .map_err(|e| DBError::ValueError(format!("MsgPack serialize: {}", e))),
            SerialKind::Cbor => serde_cbor::to_vec(val)
                .map_err(|e| DBError::ValueError(format!("CBOR serialize: {}", e))),
        }
    }

    fn deserialize(&self, raw: &[u8]) -> Result<T, DBError> {
        match self.kind {
            SerialKind::Json => serde_json::from_slice(raw)
                .map_err(|e| DBError::ValueError(format!("JSON deserialize: {}", e))),
            SerialKind::Mgpk => rmp_serde::from_slice(raw)
                .map_err(|e| DBError::ValueError(format!("MsgPack deserialize: {}", e))),
            SerialKind::Cbor => serde_cbor::from_slice(raw)
                .map_err(|e| DBError::ValueError(format!("CBOR deserialize: {}", e))),
        }
    }

    /// Write the record at keys only when absent. Returns false when the
    /// key already exists.
    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &T) -> Result<bool, DBError> {
        let raw = self.serialize(val)?;
        self.db.put_val(&self.sdb, &self.tokey(keys)?, &raw)
    }

    /// Write the record at keys, overwriting.
    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &T) -> Result<bool, DBError> {
        let raw = self.serialize(val)?;
        self.db.set_val(&self.sdb, &self.tokey(keys)?, &raw)
    }

    /// Overwrite the record at keys only when present. Returns false when
    /// the key is absent.
    pub fn update<K: AsRef<[u8]>>(&self, keys: &[K], val: &T) -> Result<bool, DBError> {
        let raw = self.serialize(val)?;
        self.db.update_val(&self.sdb, &self.tokey(keys)?, &raw)
    }

    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<T>, DBError> {
        match self.db.get_val(&self.sdb, &self.tokey(keys)?)? {
            Some(raw) => Ok(Some(self.deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, DBError> {
        self.db.del_val(&self.sdb, &self.tokey(keys)?)
    }

    pub fn cnt_all(&self) -> Result<u64, DBError> {
        self.db.cnt(&self.sdb)
    }

    pub fn get_item_iter(&self) -> Result<Vec<(Vec<u8>, T)>, DBError> {
        let mut items = Vec::new();
        for (key, raw) in self.db.get_top_items(&self.sdb, b"")? {
            items.push((key, self.deserialize(&raw)?));
        }
        Ok(items)
    }
}
