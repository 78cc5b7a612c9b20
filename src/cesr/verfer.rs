use crate::cesr::{mtr_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;
use sodiumoxide::crypto::sign::ed25519;

use p256::ecdsa::{signature::Verifier, Signature as P256Signature, VerifyingKey};
use secp256k1::ecdsa::Signature as K1Signature;
use secp256k1::{Message, PublicKey, Secp256k1};
use sha2::{Digest, Sha256};

const VERFER_CODES: [&str; 6] = [
    mtr_dex::ED25519N,
    mtr_dex::ED25519,
    mtr_dex::ECDSA_256K1N,
    mtr_dex::ECDSA_256K1,
    mtr_dex::ECDSA_256R1N,
    mtr_dex::ECDSA_256R1,
];

/// Verfer is a Matter subclass with method to verify a signature over a
/// serialization using .raw as verifier key and .code for cipher suite.
#[derive(Debug, Clone, PartialEq)]
pub struct Verfer {
    base: BaseMatter,
}

impl Verfer {
    pub fn new(raw: Option<&[u8]>, code: Option<&str>) -> Result<Self, MatterError> {
        let code = code.unwrap_or(mtr_dex::ED25519);
        let base = BaseMatter::new(raw, Some(code), None, None)?;

        if !VERFER_CODES.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Verfer { base })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64(qb64)?;

        if !VERFER_CODES.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Verfer { base })
    }

    /// Verify a signature over ser, dispatching on the cipher suite code.
    pub fn verify(&self, sig: &[u8], ser: &[u8]) -> Result<bool, MatterError> {
        match self.code() {
            code if code == mtr_dex::ED25519N || code == mtr_dex::ED25519 => {
                self.ed25519_verify(sig, ser)
            }
            code if code == mtr_dex::ECDSA_256K1N || code == mtr_dex::ECDSA_256K1 => {
                self.secp256k1_verify(sig, ser)
            }
            code if code == mtr_dex::ECDSA_256R1N || code == mtr_dex::ECDSA_256R1 => {
                self.secp256r1_verify(sig, ser)
            }
            _ => Err(MatterError::UnsupportedCode(String::from(self.code()))),
        }
    }

    fn ed25519_verify(&self, sig: &[u8], ser: &[u8]) -> Result<bool, MatterError> {
        if sig.len() != ed25519::SIGNATUREBYTES {
            return Err(MatterError::Validation(format!(
                "Invalid signature length={}.",
                sig.len()
            )));
        }

        let pk = ed25519::PublicKey::from_slice(self.raw())
            .ok_or_else(|| MatterError::Validation("Invalid public key format.".to_string()))?;

        let signature = ed25519::Signature::from_bytes(sig)
            .map_err(|_| MatterError::Validation("Invalid signature format.".to_string()))?;

        Ok(ed25519::verify_detached(&signature, ser, &pk))
    }

    fn secp256k1_verify(&self, sig: &[u8], ser: &[u8]) -> Result<bool, MatterError> {
        let secp = Secp256k1::verification_only();

        let public_key = PublicKey::from_slice(self.raw())
            .map_err(|e| MatterError::Validation(format!("Invalid public key: {}", e)))?;

        let signature = K1Signature::from_compact(sig)
            .map_err(|e| MatterError::Validation(format!("Invalid compact signature: {}", e)))?;

        let mut hasher = Sha256::new();
        hasher.update(ser);
        let digest: [u8; 32] = hasher.finalize().into();
        let message = Message::from_digest(digest);

        Ok(secp.verify_ecdsa(&message, &signature, &public_key).is_ok())
    }

    fn secp256r1_verify(&self, sig: &[u8], ser: &[u8]) -> Result<bool, MatterError> {
        let verifying_key = VerifyingKey::from_sec1_bytes(self.raw())
            .map_err(|e| MatterError::Validation(format!("Invalid public key: {}", e)))?;

        let signature = P256Signature::try_from(sig)
            .map_err(|e| MatterError::Validation(format!("Invalid signature format: {}", e)))?;

        Ok(verifying_key.verify(ser, &signature).is_ok())
    }
}

impl Parsable for Verfer {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;

        if !VERFER_CODES.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Verfer { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;

        if !VERFER_CODES.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Verfer { base })
    }
}

impl Matter for Verfer {
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
    fn test_verfer_ed25519() {
        sodiumoxide::init().expect("sodium init");

        let seed = ed25519::Seed::from_slice(&[0u8; 32]).unwrap();
        let (pk, sk) = ed25519::keypair_from_seed(&seed);

        let verfer = Verfer::new(Some(pk.as_ref()), Some(mtr_dex::ED25519N)).unwrap();
        assert_eq!(verfer.code(), mtr_dex::ED25519N);
        assert_eq!(verfer.raw(), pk.as_ref());
        assert!(!verfer.is_transferable());

        let ser = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let sig = ed25519::sign_detached(ser, &sk);
        assert!(verfer.verify(sig.as_ref(), ser).unwrap());

        let mut bad = sig.as_ref().to_vec();
        bad[0] = bad[0].wrapping_add(1);
        assert!(!verfer.verify(&bad, ser).unwrap());

        let verfer = Verfer::new(Some(pk.as_ref()), Some(mtr_dex::ED25519)).unwrap();
        assert!(verfer.is_transferable());
        assert!(verfer.verify(sig.as_ref(), ser).unwrap());
    }

    #[test]
    fn test_verfer_bad_code() {
        let result = Verfer::new(Some(&[0u8; 32]), Some(mtr_dex::BLAKE3_256));
        assert!(result.is_err());
    }

    #[test]
    fn test_verfer_parse_round_trip() {
        let qb64 = "BGlOiUdp5sMmfotHfCWQKEzWR91C72AH0lT84c0um-Qj";
        let mut stream = qb64.as_bytes().to_vec();
        let verfer = Verfer::from_qb64b(&mut stream, Some(true)).unwrap();
        assert_eq!(verfer.qb64(), qb64);
        assert!(stream.is_empty());
    }
}
