use crate::cesr::verfer::Verfer;
use crate::cesr::{mtr_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;

const SIG_CODES: [&str; 3] = [
    mtr_dex::ED25519_SIG,
    mtr_dex::ECDSA_256K1_SIG,
    mtr_dex::ECDSA_256R1_SIG,
];

/// Cigar is a Matter subclass holding an unindexed signature with an
/// optional attached Verfer for the signing public key.
#[derive(Debug, Clone)]
pub struct Cigar {
    base: BaseMatter,
    pub verfer: Option<Verfer>,
}

impl Cigar {
    pub fn new(
        raw: Option<&[u8]>,
        code: Option<&str>,
        verfer: Option<Verfer>,
    ) -> Result<Self, MatterError> {
        let code = code.unwrap_or(mtr_dex::ED25519_SIG);
        if !SIG_CODES.contains(&code) {
            return Err(MatterError::UnsupportedCode(String::from(code)));
        }

        let base = BaseMatter::new(raw, Some(code), None, None)?;
        Ok(Cigar { base, verfer })
    }

    pub fn verfer(&self) -> Option<&Verfer> {
        self.verfer.as_ref()
    }
}

impl Parsable for Cigar {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if !SIG_CODES.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Cigar { base, verfer: None })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if !SIG_CODES.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Cigar { base, verfer: None })
    }
}

impl Matter for Cigar {
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
    use sodiumoxide::crypto::sign::ed25519;

    #[test]
    fn test_cigar() {
        sodiumoxide::init().expect("sodium init");

        let seed = ed25519::Seed::from_slice(&[0u8; 32]).unwrap();
        let (pk, sk) = ed25519::keypair_from_seed(&seed);

        let ser = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let sig = ed25519::sign_detached(ser, &sk);

        let verfer = Verfer::new(Some(pk.as_ref()), Some(mtr_dex::ED25519)).unwrap();
        let cigar = Cigar::new(
            Some(sig.as_ref()),
            Some(mtr_dex::ED25519_SIG),
            Some(verfer.clone()),
        )
        .unwrap();

        assert_eq!(cigar.code(), mtr_dex::ED25519_SIG);
        assert_eq!(cigar.raw(), sig.as_ref());
        assert!(cigar.verfer().unwrap().verify(cigar.raw(), ser).unwrap());

        let cigar2 = Cigar::new(Some(sig.as_ref()), None, None).unwrap();
        assert!(cigar2.verfer().is_none());
        assert_eq!(cigar2.qb64(), cigar.qb64());
    }
}
