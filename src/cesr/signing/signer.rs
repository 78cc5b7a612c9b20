use crate::cesr::cigar::Cigar;
use crate::cesr::indexing::{idr_dex, Siger};
use crate::cesr::signing::Sigmat;
use crate::cesr::verfer::Verfer;
use crate::cesr::{mtr_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;
use p256::ecdsa::{signature::Signer as P256Signer, Signature as P256Signature, SigningKey};
use rand_core::{OsRng, RngCore};
use secp256k1::{Message, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use sodiumoxide::crypto::sign::ed25519;
use sodiumoxide::randombytes;

/// Signer is a Matter subclass with method to create a signature over a
/// serialization using:
///     .raw as signing (private) key seed,
///     .code as cipher suite for signing,
///     .verfer whose .raw is the corresponding public key.
///
/// The verfer is always derived from the private seed; its code carries
/// the transferable flag.
#[derive(Debug, Clone)]
pub struct Signer {
    base: BaseMatter,
    verfer: Verfer,
}

impl Signer {
    /// Create a signer from a seed, generating fresh entropy when no raw
    /// seed is provided.
    pub fn new(
        raw: Option<&[u8]>,
        code: Option<&str>,
        transferable: Option<bool>,
    ) -> Result<Self, MatterError> {
        let code = code.unwrap_or(mtr_dex::ED25519_SEED);
        let transferable = transferable.unwrap_or(true);

        let raw_bytes = match raw {
            Some(bytes) => bytes.to_vec(),
            None => match code {
                mtr_dex::ED25519_SEED => {
                    sodiumoxide::init()
                        .map_err(|_| MatterError::Crypto("Sodium initialization failed".into()))?;
                    randombytes::randombytes(ed25519::SEEDBYTES)
                }
                mtr_dex::ECDSA_256K1_SEED | mtr_dex::ECDSA_256R1_SEED => {
                    let mut seed = vec![0u8; 32];
                    OsRng.fill_bytes(&mut seed);
                    seed
                }
                _ => {
                    return Err(MatterError::UnexpectedCode(format!(
                        "Unsupported signer code: {}",
                        code
                    )))
                }
            },
        };

        let base = BaseMatter::new(Some(&raw_bytes), Some(code), None, None)?;
        let verfer = Self::derive_verfer(&base, transferable)?;

        Ok(Signer { base, verfer })
    }

    fn derive_verfer(base: &BaseMatter, transferable: bool) -> Result<Verfer, MatterError> {
        match base.code() {
            mtr_dex::ED25519_SEED => {
                sodiumoxide::init()
                    .map_err(|_| MatterError::Crypto("Sodium initialization failed".into()))?;
                let seed = ed25519::Seed::from_slice(base.raw())
                    .ok_or_else(|| MatterError::Crypto("Invalid Ed25519 seed".to_string()))?;
                let (pk, _) = ed25519::keypair_from_seed(&seed);
                let code = if transferable {
                    mtr_dex::ED25519
                } else {
                    mtr_dex::ED25519N
                };
                Verfer::new(Some(&pk[..]), Some(code))
            }
            mtr_dex::ECDSA_256K1_SEED => {
                let seed: [u8; 32] = base
                    .raw()
                    .try_into()
                    .map_err(|_| MatterError::Crypto("Invalid Secp256k1 seed".into()))?;
                let secp = Secp256k1::new();
                let secret_key = SecretKey::from_byte_array(&seed)
                    .map_err(|_| MatterError::Crypto("Invalid Secp256k1 seed".into()))?;
                let public_key = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
                let code = if transferable {
                    mtr_dex::ECDSA_256K1
                } else {
                    mtr_dex::ECDSA_256K1N
                };
                Verfer::new(Some(&public_key.serialize()), Some(code))
            }
            mtr_dex::ECDSA_256R1_SEED => {
                let signing_key = SigningKey::from_slice(base.raw())
                    .map_err(|_| MatterError::Crypto("Invalid P256 seed".into()))?;
                let verkey = signing_key
                    .verifying_key()
                    .to_encoded_point(true)
                    .as_bytes()
                    .to_vec();
                let code = if transferable {
                    mtr_dex::ECDSA_256R1
                } else {
                    mtr_dex::ECDSA_256R1N
                };
                Verfer::new(Some(&verkey), Some(code))
            }
            _ => Err(MatterError::UnexpectedCode(format!(
                "Unsupported signer code: {}",
                base.code()
            ))),
        }
    }

    /// Recreate a signer from its qb64 seed, deriving the verfer with the
    /// given transferable flag.
    pub fn from_qb64b_and_transferable(
        data: &mut Vec<u8>,
        strip: Option<bool>,
        transferable: bool,
    ) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        let verfer = Self::derive_verfer(&base, transferable)?;
        Ok(Signer { base, verfer })
    }

    pub fn verfer(&self) -> &Verfer {
        &self.verfer
    }

    /// Sign the serialization. Without an index the result is an
    /// unindexed Cigar; with one it is an indexed Siger whose code is
    /// selected by index size and the only flag.
    pub fn sign(
        &self,
        ser: &[u8],
        index: Option<u32>,
        only: Option<bool>,
        ondex: Option<u32>,
    ) -> Result<Sigmat, MatterError> {
        let only = only.unwrap_or(false);

        let (sig, codes) = match self.base.code() {
            mtr_dex::ED25519_SEED => (
                self.sign_ed25519(ser)?,
                (
                    mtr_dex::ED25519_SIG,
                    idr_dex::ED25519_SIG,
                    idr_dex::ED25519_CRT_SIG,
                    idr_dex::ED25519_BIG_SIG,
                    idr_dex::ED25519_BIG_CRT_SIG,
                ),
            ),
            mtr_dex::ECDSA_256K1_SEED => (
                self.sign_secp256k1(ser)?,
                (
                    mtr_dex::ECDSA_256K1_SIG,
                    idr_dex::ECDSA_256K1_SIG,
                    idr_dex::ECDSA_256K1_CRT_SIG,
                    idr_dex::ECDSA_256K1_BIG_SIG,
                    idr_dex::ECDSA_256K1_BIG_CRT_SIG,
                ),
            ),
            mtr_dex::ECDSA_256R1_SEED => (
                self.sign_secp256r1(ser)?,
                (
                    mtr_dex::ECDSA_256R1_SIG,
                    idr_dex::ECDSA_256R1_SIG,
                    idr_dex::ECDSA_256R1_CRT_SIG,
                    idr_dex::ECDSA_256R1_BIG_SIG,
                    idr_dex::ECDSA_256R1_BIG_CRT_SIG,
                ),
            ),
            _ => {
                return Err(MatterError::UnexpectedCode(format!(
                    "Unsupported signer code: {}",
                    self.base.code()
                )))
            }
        };

        let (cigar_code, small, small_crt, big, big_crt) = codes;

        match index {
            None => {
                let cigar = Cigar::new(Some(&sig), Some(cigar_code), Some(self.verfer.clone()))?;
                Ok(Sigmat::NonIndexed(cigar))
            }
            Some(idx) => {
                let (code, ondex) = if only {
                    let code = if idx <= 63 { small_crt } else { big_crt };
                    (code, None)
                } else {
                    let ondex = ondex.unwrap_or(idx);
                    let code = if ondex == idx && idx <= 63 { small } else { big };
                    (code, Some(ondex))
                };

                let siger = Siger::new(
                    Some(&sig),
                    Some(code),
                    Some(idx),
                    ondex,
                    Some(self.verfer.clone()),
                )?;
                Ok(Sigmat::Indexed(siger))
            }
        }
    }

    fn sign_ed25519(&self, ser: &[u8]) -> Result<Vec<u8>, MatterError> {
        sodiumoxide::init()
            .map_err(|_| MatterError::Crypto("Sodium initialization failed".into()))?;

        let seed = ed25519::Seed::from_slice(self.base.raw())
            .ok_or_else(|| MatterError::Crypto("Invalid Ed25519 seed".into()))?;
        let (_, sk) = ed25519::keypair_from_seed(&seed);

        Ok(ed25519::sign_detached(ser, &sk).as_ref().to_vec())
    }

    fn sign_secp256k1(&self, ser: &[u8]) -> Result<Vec<u8>, MatterError> {
        let secp = Secp256k1::new();
        let seed: [u8; 32] = self
            .base
            .raw()
            .try_into()
            .map_err(|_| MatterError::Crypto("Invalid Secp256k1 seed".into()))?;
        let secret_key = SecretKey::from_byte_array(&seed)
            .map_err(|_| MatterError::Crypto("Invalid Secp256k1 seed".into()))?;

        let mut hasher = Sha256::new();
        hasher.update(ser);
        let digest: [u8; 32] = hasher.finalize().into();
        let message = Message::from_digest(digest);

        let signature = secp.sign_ecdsa(&message, &secret_key);
        Ok(signature.serialize_compact().to_vec())
    }

    fn sign_secp256r1(&self, ser: &[u8]) -> Result<Vec<u8>, MatterError> {
        let signing_key = SigningKey::from_slice(self.base.raw())
            .map_err(|_| MatterError::Crypto("Invalid P256 seed".into()))?;

        let signature: P256Signature = signing_key.sign(ser);
        Ok(signature.to_bytes().to_vec())
    }
}

impl Parsable for Signer {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Self::from_qb64b_and_transferable(data, strip, true)
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        let verfer = Self::derive_verfer(&base, true)?;
        Ok(Signer { base, verfer })
    }
}

impl Matter for Signer {
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
    fn test_signer_random() {
        let signer = Signer::new(None, None, None).unwrap();
        assert_eq!(signer.code(), mtr_dex::ED25519_SEED);
        assert_eq!(signer.verfer().code(), mtr_dex::ED25519);

        let signer2 = Signer::new(None, None, Some(false)).unwrap();
        assert_eq!(signer2.verfer().code(), mtr_dex::ED25519N);
        assert_ne!(signer.qb64(), signer2.qb64());
    }

    #[test]
    fn test_signer_deterministic_from_seed() {
        let seed = [5u8; 32];
        let signer = Signer::new(Some(&seed), None, None).unwrap();
        let signer2 = Signer::new(Some(&seed), None, None).unwrap();
        assert_eq!(signer.qb64(), signer2.qb64());
        assert_eq!(signer.verfer().qb64(), signer2.verfer().qb64());
    }

    #[test]
    fn test_signer_sign_and_verify_unindexed() {
        let seed = [1u8; 32];
        let signer = Signer::new(Some(&seed), None, None).unwrap();
        let ser = b"message to sign";

        match signer.sign(ser, None, None, None).unwrap() {
            Sigmat::NonIndexed(cigar) => {
                assert_eq!(cigar.code(), mtr_dex::ED25519_SIG);
                assert!(signer.verfer().verify(cigar.raw(), ser).unwrap());
            }
            Sigmat::Indexed(_) => panic!("expected unindexed signature"),
        }
    }

    #[test]
    fn test_signer_sign_indexed() {
        let seed = [2u8; 32];
        let signer = Signer::new(Some(&seed), None, None).unwrap();
        let ser = b"message to sign";

        match signer.sign(ser, Some(3), None, None).unwrap() {
            Sigmat::Indexed(siger) => {
                assert_eq!(siger.code(), idr_dex::ED25519_SIG);
                assert_eq!(siger.index(), 3);
                assert!(signer.verfer().verify(siger.raw(), ser).unwrap());
            }
            Sigmat::NonIndexed(_) => panic!("expected indexed signature"),
        }

        match signer.sign(ser, Some(3), Some(true), None).unwrap() {
            Sigmat::Indexed(siger) => {
                assert_eq!(siger.code(), idr_dex::ED25519_CRT_SIG);
                assert_eq!(siger.ondex(), None);
            }
            Sigmat::NonIndexed(_) => panic!("expected indexed signature"),
        }
    }

    #[test]
    fn test_signer_round_trip_with_transferable() {
        let seed = [9u8; 32];
        let signer = Signer::new(Some(&seed), None, Some(false)).unwrap();

        let mut stream = signer.qb64b();
        let restored = Signer::from_qb64b_and_transferable(&mut stream, Some(true), false).unwrap();
        assert_eq!(restored.verfer().qb64(), signer.verfer().qb64());
        assert!(stream.is_empty());
    }

    #[test]
    fn test_signer_secp256k1() {
        let seed = [4u8; 32];
        let signer = Signer::new(Some(&seed), Some(mtr_dex::ECDSA_256K1_SEED), None).unwrap();
        assert_eq!(signer.verfer().code(), mtr_dex::ECDSA_256K1);

        let ser = b"secp256k1 message";
        match signer.sign(ser, None, None, None).unwrap() {
            Sigmat::NonIndexed(cigar) => {
                assert!(signer.verfer().verify(cigar.raw(), ser).unwrap());
            }
            Sigmat::Indexed(_) => panic!("expected unindexed signature"),
        }
    }
}
