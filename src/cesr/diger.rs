use crate::cesr::{dig_dex, mtr_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2s256, Digest as Blake2Digest};

type Blake2b256 = Blake2b<U32>;
use sha2::{Sha256, Sha512};
use sha3::{Digest as Sha3Digest, Sha3_256, Sha3_512};

/// Diger is a Matter subclass holding a digest with method to verify the
/// digest against a serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Diger {
    base: BaseMatter,
}

impl Diger {
    pub fn new(raw: Option<&[u8]>, code: Option<&str>) -> Result<Self, MatterError> {
        let code = code.unwrap_or(mtr_dex::BLAKE3_256);
        if !dig_dex::TUPLE.contains(&code) {
            return Err(MatterError::UnsupportedCode(String::from(code)));
        }

        let base = BaseMatter::new(raw, Some(code), None, None)?;
        Ok(Diger { base })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64(qb64)?;
        if !dig_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Diger { base })
    }

    /// Digest a serialization under the given code (default Blake3-256).
    pub fn from_ser(ser: &[u8], code: Option<&str>) -> Result<Self, MatterError> {
        let code = code.unwrap_or(mtr_dex::BLAKE3_256);
        let raw = Diger::digest(ser, code)?;
        let base = BaseMatter::new(Some(&raw), Some(code), None, None)?;
        Ok(Diger { base })
    }

    pub fn digest(ser: &[u8], code: &str) -> Result<Vec<u8>, MatterError> {
        match code {
            dig_dex::BLAKE3_256 => Ok(blake3::hash(ser).as_bytes().to_vec()),
            dig_dex::BLAKE3_512 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(ser);
                let mut digest = [0u8; 64];
                hasher.finalize_xof().fill(&mut digest);
                Ok(digest.to_vec())
            }
            dig_dex::BLAKE2B_256 => {
                let mut hasher = Blake2b256::new();
                Blake2Digest::update(&mut hasher, ser);
                Ok(hasher.finalize().to_vec())
            }
            dig_dex::BLAKE2S_256 => {
                let mut hasher = Blake2s256::new();
                Blake2Digest::update(&mut hasher, ser);
                Ok(hasher.finalize().to_vec())
            }
            dig_dex::SHA3_256 => {
                let mut hasher = Sha3_256::new();
                Sha3Digest::update(&mut hasher, ser);
                Ok(hasher.finalize().to_vec())
            }
            dig_dex::SHA3_512 => {
                let mut hasher = Sha3_512::new();
                Sha3Digest::update(&mut hasher, ser);
                Ok(hasher.finalize().to_vec())
            }
            dig_dex::SHA2_256 => {
                let mut hasher = Sha256::new();
                sha2::Digest::update(&mut hasher, ser);
                Ok(hasher.finalize().to_vec())
            }
            dig_dex::SHA2_512 => {
                let mut hasher = Sha512::new();
                sha2::Digest::update(&mut hasher, ser);
                Ok(hasher.finalize().to_vec())
            }
            _ => Err(MatterError::UnsupportedCode(String::from(code))),
        }
    }

    /// True when this digest matches the digest of ser under .code
    pub fn verify(&self, ser: &[u8]) -> bool {
        match Diger::digest(ser, self.base.code()) {
            Ok(raw) => self.base.raw() == raw.as_slice(),
            Err(_) => false,
        }
    }
}

impl Parsable for Diger {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if !dig_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Diger { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if !dig_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Diger { base })
    }
}

impl Matter for Diger {
    fn code(&self) -> &str {
        self.base.code()
    }

    fn soft(&self) -> &str {
        self.base.soft()
    }

    fn raw(&self) -> &[u8] {
        self.base.raw()
    }

    fn qb64(&self) -> String {
        self.base.qb64()
    }

    fn qb64b(&self) -> Vec<u8> {
        self.base.qb64b()
    }

    fn qb2(&self) -> Vec<u8> {
        self.base.qb2()
    }

    fn full_size(&self) -> usize {
        self.base.full_size()
    }

    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn is_transferable(&self) -> bool {
        self.base.is_transferable()
    }

    fn is_digestive(&self) -> bool {
        self.base.is_digestive()
    }

    fn is_prefixive(&self) -> bool {
        self.base.is_prefixive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diger_blake3() {
        let ser = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let dig = blake3::hash(ser).as_bytes().to_vec();

        let diger = Diger::new(Some(&dig), None).unwrap();
        assert_eq!(diger.code(), mtr_dex::BLAKE3_256);
        assert_eq!(diger.raw(), dig.as_slice());
        assert!(diger.is_digestive());
        assert!(diger.verify(ser));

        let diger2 = Diger::from_ser(ser, None).unwrap();
        assert_eq!(diger2.qb64(), diger.qb64());
        assert!(diger2.verify(ser));
        assert!(!diger2.verify(b"something else"));
    }

    #[test]
    fn test_diger_other_suites() {
        let ser = b"abcdefghijklmnopqrstuvwxyz0123456789";
        for code in dig_dex::TUPLE {
            let diger = Diger::from_ser(ser, Some(code)).unwrap();
            assert_eq!(diger.code(), code);
            assert!(diger.verify(ser));
        }
    }

    #[test]
    fn test_diger_bad_code() {
        assert!(Diger::new(Some(&[0u8; 32]), Some(mtr_dex::ED25519)).is_err());
    }

    #[test]
    fn test_diger_round_trip() {
        let ser = b"serialization";
        let diger = Diger::from_ser(ser, None).unwrap();

        let mut stream = diger.qb64b();
        let diger2 = Diger::from_qb64b(&mut stream, Some(true)).unwrap();
        assert_eq!(diger2.qb64(), diger.qb64());
        assert!(stream.is_empty());
    }
}
