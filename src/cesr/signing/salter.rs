use crate::cesr::signing::signer::Signer;
use crate::cesr::{mtr_dex, raw_size, BaseMatter, Parsable, Tiers};
use crate::errors::MatterError;
use crate::Matter;
use sodiumoxide::crypto::pwhash::argon2id13 as pwhash;
use sodiumoxide::crypto::pwhash::argon2id13::Salt;
use sodiumoxide::randombytes;

/// Salter is a Matter subclass maintaining a random salt as root entropy
/// for deterministic derivation of secrets (private key seeds).
///
/// To initialize with a deterministic salt pass in 16 bytes of raw:
///     let salter = Salter::new(Some(b"0123456789abcdef"), None, None)?;
///
/// To derive a secret from a path call .signer:
///     let signer = salter.signer(None, None, "00", None, false)?;
#[derive(Debug, Clone)]
pub struct Salter {
    base: BaseMatter,
    tier: Tiers,
}

impl Salter {
    pub fn new(
        raw: Option<&[u8]>,
        code: Option<&str>,
        tier: Option<Tiers>,
    ) -> Result<Self, MatterError> {
        let code = code.unwrap_or(mtr_dex::SALT_128);
        if code != mtr_dex::SALT_128 {
            return Err(MatterError::Validation(format!(
                "Unsupported salter code = {}.",
                code
            )));
        }

        let raw = match raw {
            Some(r) => r.to_vec(),
            None => {
                sodiumoxide::init()
                    .map_err(|_| MatterError::Crypto("Sodium initialization failed".into()))?;
                randombytes::randombytes(pwhash::SALTBYTES)
            }
        };

        let tier = tier.unwrap_or(Tiers::Low);
        let base = BaseMatter::new(Some(&raw), Some(code), None, None)?;

        Ok(Salter { base, tier })
    }

    pub fn from_qb64(qb64: &str, tier: Option<Tiers>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64(qb64)?;
        if base.code() != mtr_dex::SALT_128 {
            return Err(MatterError::Validation(format!(
                "Unsupported salter code = {}.",
                base.code()
            )));
        }

        Ok(Salter {
            base,
            tier: tier.unwrap_or(Tiers::Low),
        })
    }

    pub fn tier(&self) -> Tiers {
        self.tier
    }

    /// Returns a raw binary seed of the given size derived from path and
    /// .raw, stretched with the argon2id KDF. The tier selects the work
    /// factor; temp shortcuts the work for tests only.
    pub fn stretch(
        &self,
        size: usize,
        path: &str,
        tier: Option<Tiers>,
        temp: bool,
    ) -> Result<Vec<u8>, MatterError> {
        let tier = tier.unwrap_or(self.tier);

        let (opslimit, memlimit) = if temp {
            (pwhash::OpsLimit(1), pwhash::MemLimit(8192))
        } else {
            match tier {
                Tiers::Low => (pwhash::OPSLIMIT_INTERACTIVE, pwhash::MEMLIMIT_INTERACTIVE),
                Tiers::Mid => (pwhash::OPSLIMIT_MODERATE, pwhash::MEMLIMIT_MODERATE),
                Tiers::High => (pwhash::OPSLIMIT_SENSITIVE, pwhash::MEMLIMIT_SENSITIVE),
            }
        };

        sodiumoxide::init()
            .map_err(|_| MatterError::Crypto("Sodium initialization failed".into()))?;

        let salt = Salt::from_slice(self.raw())
            .ok_or_else(|| MatterError::Validation("Invalid salt size.".to_string()))?;

        let mut kb = vec![0u8; size];
        let seed = pwhash::derive_key(&mut kb, path.as_bytes(), &salt, opslimit, memlimit)
            .map_err(|_| MatterError::Conversion("Key derivation failed.".to_string()))?;

        Ok(seed.to_vec())
    }

    /// Returns a Signer whose secret is derived from path and .raw and
    /// stretched to the size required by code. The public key code of the
    /// verfer is selected by code and transferable.
    pub fn signer(
        &self,
        code: Option<&str>,
        transferable: Option<bool>,
        path: &str,
        tier: Option<Tiers>,
        temp: bool,
    ) -> Result<Signer, MatterError> {
        let code = code.unwrap_or(mtr_dex::ED25519_SEED);
        let size = raw_size(code)?;
        let seed = self.stretch(size, path, tier, temp)?;

        Signer::new(Some(&seed), Some(code), transferable)
    }

    /// Returns count Signers with unique derivation paths made from the
    /// path prefix plus the hex suffix of start plus offset.
    pub fn signers(
        &self,
        count: usize,
        start: usize,
        path: &str,
        code: Option<&str>,
        transferable: Option<bool>,
        tier: Option<Tiers>,
        temp: bool,
    ) -> Result<Vec<Signer>, MatterError> {
        let mut signers = Vec::with_capacity(count);

        for i in 0..count {
            let path = format!("{}{:x}", path, i + start);
            signers.push(self.signer(code, transferable, &path, tier, temp)?);
        }

        Ok(signers)
    }
}

impl Parsable for Salter {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if base.code() != mtr_dex::SALT_128 {
            return Err(MatterError::Validation(format!(
                "Unsupported salter code = {}.",
                base.code()
            )));
        }

        Ok(Salter {
            base,
            tier: Tiers::Low,
        })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if base.code() != mtr_dex::SALT_128 {
            return Err(MatterError::Validation(format!(
                "Unsupported salter code = {}.",
                base.code()
            )));
        }

        Ok(Salter {
            base,
            tier: Tiers::Low,
        })
    }
}

impl Matter for Salter {
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
    fn test_salter_creation() {
        let salter = Salter::new(None, None, None).unwrap();
        assert_eq!(salter.code(), mtr_dex::SALT_128);
        assert_eq!(salter.raw().len(), 16);
        assert_eq!(salter.tier(), Tiers::Low);

        let raw = b"0123456789abcdef";
        let salter = Salter::new(Some(raw), None, None).unwrap();
        assert_eq!(salter.raw(), raw);
        assert_eq!(salter.qb64(), "0AAwMTIzNDU2Nzg5YWJjZGVm");
    }

    #[test]
    fn test_salter_from_qb64() {
        let qb64 = "0AAwMTIzNDU2Nzg5YWJjZGVm";
        let salter = Salter::from_qb64(qb64, None).unwrap();
        assert_eq!(salter.raw(), b"0123456789abcdef");
        assert_eq!(salter.qb64(), qb64);

        assert!(Salter::from_qb64("MAAB", None).is_err());
    }

    #[test]
    fn test_stretch_deterministic() {
        let raw = b"0123456789abcdef";
        let salter = Salter::new(Some(raw), None, None).unwrap();

        let stretched = salter.stretch(32, "test-path", None, true).unwrap();
        assert_eq!(stretched.len(), 32);

        let stretched2 = salter.stretch(32, "test-path", None, true).unwrap();
        assert_eq!(stretched, stretched2);

        let stretched3 = salter.stretch(32, "different-path", None, true).unwrap();
        assert_ne!(stretched, stretched3);
    }

    #[test]
    fn test_signer_derivation() {
        let raw = b"0123456789abcdef";
        let salter = Salter::new(Some(raw), None, None).unwrap();

        let signer = salter.signer(None, None, "00", None, true).unwrap();
        assert_eq!(signer.code(), mtr_dex::ED25519_SEED);
        assert_eq!(signer.verfer().code(), mtr_dex::ED25519);

        let signer2 = salter.signer(None, None, "00", None, true).unwrap();
        assert_eq!(signer.qb64(), signer2.qb64());
        assert_eq!(signer.verfer().qb64(), signer2.verfer().qb64());

        let signer3 = salter.signer(None, None, "01", None, true).unwrap();
        assert_ne!(signer.qb64(), signer3.qb64());
    }

    #[test]
    fn test_signers_batch() {
        let raw = b"0123456789abcdef";
        let salter = Salter::new(Some(raw), None, None).unwrap();

        let signers = salter.signers(3, 0, "0", None, None, None, true).unwrap();
        assert_eq!(signers.len(), 3);
        assert_ne!(signers[0].qb64(), signers[1].qb64());
        assert_ne!(signers[1].qb64(), signers[2].qb64());

        // Batch derivation matches per-path derivation
        let lone = salter.signer(None, None, "01", None, true).unwrap();
        assert_eq!(signers[1].qb64(), lone.qb64());
    }

    #[test]
    fn test_salter_parse_round_trip() {
        let raw = b"0123456789abcdef";
        let salter = Salter::new(Some(raw), None, None).unwrap();

        let mut stream = salter.qb64b();
        let parsed = Salter::from_qb64b(&mut stream, Some(true)).unwrap();
        assert_eq!(parsed.raw(), raw);
        assert!(stream.is_empty());
    }
}
