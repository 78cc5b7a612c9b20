use crate::cesr::{pre_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;

/// Prefixer is a Matter subclass holding an autonomic identifier prefix.
/// The code must be a valid prefix derivation, either a basic public key
/// or a self-addressing digest.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefixer {
    base: BaseMatter,
}

impl Prefixer {
    pub fn new(raw: Option<&[u8]>, code: Option<&str>) -> Result<Self, MatterError> {
        let code = code.unwrap_or(pre_dex::ED25519);
        if !pre_dex::TUPLE.contains(&code) {
            return Err(MatterError::UnsupportedCode(String::from(code)));
        }

        let base = BaseMatter::new(raw, Some(code), None, None)?;
        Ok(Prefixer { base })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64(qb64)?;
        if !pre_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Prefixer { base })
    }
}

impl Parsable for Prefixer {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if !pre_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Prefixer { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if !pre_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Prefixer { base })
    }
}

impl Matter for Prefixer {
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
    use crate::cesr::mtr_dex;

    #[test]
    fn test_prefixer_basic() {
        let qb64 = "BGlOiUdp5sMmfotHfCWQKEzWR91C72AH0lT84c0um-Qj";
        let prefixer = Prefixer::from_qb64(qb64).unwrap();
        assert_eq!(prefixer.code(), mtr_dex::ED25519N);
        assert_eq!(prefixer.qb64(), qb64);
        assert!(prefixer.is_prefixive());
        assert!(!prefixer.is_transferable());
    }

    #[test]
    fn test_prefixer_digest_code() {
        let dig = blake3::hash(b"inception event").as_bytes().to_vec();
        let prefixer = Prefixer::new(Some(&dig), Some(mtr_dex::BLAKE3_256)).unwrap();
        assert!(prefixer.is_prefixive());
        assert!(prefixer.is_digestive());
    }

    #[test]
    fn test_prefixer_bad_code() {
        assert!(Prefixer::new(Some(&[0u8; 32]), Some(mtr_dex::ED25519_SEED)).is_err());
    }
}
