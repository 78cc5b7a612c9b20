use crate::cesr::Parsable;
use crate::keri::db::dbing::LMDBer;
use crate::keri::db::subing::{SuberBase, SuberError};
use crate::Matter;
use std::marker::PhantomData;
use std::sync::Arc;

/// CesrSuber stores any qualified primitive as its qb64 bytes. The type
/// parameter is the class token that deserializes values back into the
/// concrete primitive.
pub struct CesrSuber<'db, T: Parsable + Matter> {
    base: SuberBase<'db>,
    _klas: PhantomData<T>,
}

impl<'db, T: Parsable + Matter> CesrSuber<'db, T> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep)?,
            _klas: PhantomData,
        })
    }

    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &T) -> Result<bool, SuberError> {
        self.base.put_bytes(keys, &val.qb64b())
    }

    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &T) -> Result<bool, SuberError> {
        self.base.pin_bytes(keys, &val.qb64b())
    }

    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<T>, SuberError> {
        match self.base.get_bytes(keys)? {
            Some(mut raw) => Ok(Some(T::from_qb64b(&mut raw, None)?)),
            None => Ok(None),
        }
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        self.base.rem(keys)
    }

    pub fn cnt_all(&self) -> Result<u64, SuberError> {
        self.base.cnt_all()
    }

    pub fn get_item_iter(&self) -> Result<Vec<(Vec<u8>, T)>, SuberError> {
        let mut items = Vec::new();
        for (key, mut val) in self.base.get_item_iter()? {
            items.push((key, T::from_qb64b(&mut val, None)?));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cesr::diger::Diger;
    use crate::cesr::prefixer::Prefixer;

    #[test]
    fn test_cesr_suber_diger() {
        let lmdber = LMDBer::builder()
            .name("test_cesr_suber")
            .temp(true)
            .build()
            .unwrap();
        let suber: CesrSuber<Diger> = CesrSuber::new(Arc::new(&lmdber), "digs.", None).unwrap();

        let diger = Diger::from_ser(b"some event", None).unwrap();
        assert!(suber.put(&["key"], &diger).unwrap());

        let fetched = suber.get(&["key"]).unwrap().unwrap();
        assert_eq!(fetched.qb64(), diger.qb64());
        assert!(fetched.verify(b"some event"));
    }

    #[test]
    fn test_cesr_suber_prefixer_iter() {
        let lmdber = LMDBer::builder()
            .name("test_cesr_suber_iter")
            .temp(true)
            .build()
            .unwrap();
        let suber: CesrSuber<Prefixer> = CesrSuber::new(Arc::new(&lmdber), "pres.", None).unwrap();

        let qb64 = "BGlOiUdp5sMmfotHfCWQKEzWR91C72AH0lT84c0um-Qj";
        let prefixer = Prefixer::from_qb64(qb64).unwrap();
        suber.put(&[qb64], &prefixer).unwrap();

        let items = suber.get_item_iter().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].1.qb64(), qb64);
    }
}
