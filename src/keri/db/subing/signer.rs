use crate::cesr::signing::Signer;
use crate::cesr::verfer::Verfer;
use crate::cesr::Parsable;
use crate::keri::db::dbing::LMDBer;
use crate::keri::db::subing::{SuberBase, SuberError};
use crate::Matter;
use std::sync::Arc;

/// SignerSuber stores private signing seeds keyed by the qb64 of the
/// corresponding public key. The transferable flag of a reconstructed
/// Signer comes from the verfer code carried in the key itself, so only
/// the seed needs to be stored.
pub struct SignerSuber<'db> {
    base: SuberBase<'db>,
}

impl<'db> SignerSuber<'db> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep)?,
        })
    }

    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &Signer) -> Result<bool, SuberError> {
        self.base.put_bytes(keys, &val.qb64b())
    }

    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &Signer) -> Result<bool, SuberError> {
        self.base.pin_bytes(keys, &val.qb64b())
    }

    /// Gets the Signer at keys. The last key fragment must be the verkey
    /// qb64 which determines the transferable flag.
    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<Signer>, SuberError> {
        let raw = match self.base.get_bytes(keys)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let verkey = keys.last().ok_or(SuberError::EmptyKeys)?;
        let mut verkey = verkey.as_ref().to_vec();
        let verfer = Verfer::from_qb64b(&mut verkey, None)?;

        let mut qb64b = raw;
        let signer =
            Signer::from_qb64b_and_transferable(&mut qb64b, None, verfer.is_transferable())?;

        Ok(Some(signer))
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        self.base.rem(keys)
    }

    pub fn cnt_all(&self) -> Result<u64, SuberError> {
        self.base.cnt_all()
    }

    /// All stored signers in key order. The full key of each entry is its
    /// verkey, which restores the transferable flag.
    pub fn get_item_iter(&self) -> Result<Vec<(Vec<u8>, Signer)>, SuberError> {
        let mut items = Vec::new();
        for (key, val) in self.base.get_item_iter()? {
            let mut verkey = key.clone();
            let verfer = Verfer::from_qb64b(&mut verkey, None)?;

            let mut qb64b = val;
            let signer =
                Signer::from_qb64b_and_transferable(&mut qb64b, None, verfer.is_transferable())?;
            items.push((key, signer));
        }

        Ok(items)
    }
}
