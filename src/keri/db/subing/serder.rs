use crate::keri::core::serdering::Serder;
use crate::keri::db::dbing::LMDBer;
use crate::keri::db::subing::{SuberBase, SuberError};
use std::sync::Arc;

/// SerderSuber stores serialized events. Values are the pre-serialized
/// raw bytes carried by a Serder.
pub struct SerderSuber<'db> {
    base: SuberBase<'db>,
}

impl<'db> SerderSuber<'db> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep)?,
        })
    }

    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &Serder) -> Result<bool, SuberError> {
        self.base.put_bytes(keys, val.raw())
    }

    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &Serder) -> Result<bool, SuberError> {
        self.base.pin_bytes(keys, val.raw())
    }

    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<Serder>, SuberError> {
        Ok(self.base.get_bytes(keys)?.map(Serder::new))
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        self.base.rem(keys)
    }

    pub fn cnt_all(&self) -> Result<u64, SuberError> {
        self.base.cnt_all()
    }

    pub fn get_item_iter(&self) -> Result<Vec<(Vec<u8>, Serder)>, SuberError> {
        Ok(self
            .base
            .get_item_iter()?
            .into_iter()
            .map(|(key, val)| (key, Serder::new(val)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serder_suber_round_trip() {
        let lmdber = LMDBer::builder()
            .name("test_serder_suber")
            .temp(true)
            .build()
            .unwrap();
        let suber = SerderSuber::new(Arc::new(&lmdber), "evts.", None).unwrap();

        let serder = Serder::new(b"-FAtYKERICAAXicp".to_vec());
        assert!(suber.put(&["pre", "0"], &serder).unwrap());

        let fetched = suber.get(&["pre", "0"]).unwrap().unwrap();
        assert_eq!(fetched.raw(), serder.raw());

        assert!(suber.rem(&["pre", "0"]).unwrap());
        assert!(suber.get(&["pre", "0"]).unwrap().is_none());
    }
}
