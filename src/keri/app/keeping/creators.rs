use crate::cesr::signing::{Salter, Signer};
use crate::cesr::Tiers;
use crate::errors::MatterError;
use crate::keri::KERIError;
use crate::Matter;
use std::fmt;
use std::fmt::Debug;

/// Algorithm options for key pair creation. Randy draws fresh entropy
/// per key pair; salty derives each key pair deterministically from a
/// root salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algos {
    Randy,
    Salty,
}

impl fmt::Display for Algos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algos::Randy => write!(f, "randy"),
            Algos::Salty => write!(f, "salty"),
        }
    }
}

impl Algos {
    pub fn from_str(s: &str) -> Result<Self, KERIError> {
        match s.to_lowercase().as_str() {
            "randy" => Ok(Algos::Randy),
            "salty" => Ok(Algos::Salty),
            _ => Err(KERIError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Creator produces a batch of signers, one per requested derivation
/// code. When codes is None a list of count copies of code is used; an
/// empty codes list with count 0 yields an empty batch, which commits to
/// no next key set.
pub trait Creator: Debug {
    fn create(
        &self,
        codes: Option<Vec<&str>>,
        count: usize,
        code: &str,
        ridx: usize,
        kidx: usize,
        transferable: bool,
        temp: bool,
    ) -> Result<Vec<Signer>, MatterError>;

    /// The qb64 salt, empty for the randy algorithm
    fn salt(&self) -> String;

    /// The stretch tier, None for the randy algorithm
    fn tier(&self) -> Option<Tiers>;
}

/// RandyCreator draws fresh entropy for every key pair. Rotation and key
/// indices are ignored.
#[derive(Debug, Default)]
pub struct RandyCreator;

impl RandyCreator {
    pub fn new() -> Self {
        RandyCreator
    }
}

impl Creator for RandyCreator {
    fn create(
        &self,
        codes: Option<Vec<&str>>,
        count: usize,
        code: &str,
        _ridx: usize,
        _kidx: usize,
        transferable: bool,
        _temp: bool,
    ) -> Result<Vec<Signer>, MatterError> {
        let codes = codes.unwrap_or_else(|| vec![code; count]);

        let mut signers = Vec::with_capacity(codes.len());
        for code in codes {
            signers.push(Signer::new(None, Some(code), Some(transferable))?);
        }

        Ok(signers)
    }

    fn salt(&self) -> String {
        String::new()
    }

    fn tier(&self) -> Option<Tiers> {
        None
    }
}

/// SaltyCreator derives key pairs deterministically from a root salt.
/// The derivation path of the key pair at batch position i is the hex
/// concatenation "{ridx:x}{kidx+i:x}", so the same salt, indices, code
/// and tier always reproduce the same key pair.
#[derive(Debug)]
pub struct SaltyCreator {
    salter: Salter,
}

impl SaltyCreator {
    pub fn new(salt: Option<&str>, tier: Option<Tiers>) -> Result<Self, MatterError> {
        let salter = match salt {
            Some(salt) => Salter::from_qb64(salt, tier)?,
            None => Salter::new(None, None, tier)?,
        };

        Ok(SaltyCreator { salter })
    }

    pub fn salter(&self) -> &Salter {
        &self.salter
    }
}

impl Creator for SaltyCreator {
    fn create(
        &self,
        codes: Option<Vec<&str>>,
        count: usize,
        code: &str,
        ridx: usize,
        kidx: usize,
        transferable: bool,
        temp: bool,
    ) -> Result<Vec<Signer>, MatterError> {
        let codes = codes.unwrap_or_else(|| vec![code; count]);

        let mut signers = Vec::with_capacity(codes.len());
        for (i, &code) in codes.iter().enumerate() {
            let path = format!("{:x}{:x}", ridx, kidx + i);
            signers.push(
                self.salter
                    .signer(Some(code), Some(transferable), &path, None, temp)?,
            );
        }

        Ok(signers)
    }

    fn salt(&self) -> String {
        self.salter.qb64()
    }

    fn tier(&self) -> Option<Tiers> {
        Some(self.salter.tier())
    }
}

/// Factory producing the Creator for an algorithm.
#[derive(Debug)]
pub struct Creatory {
    algo: Algos,
}

impl Creatory {
    pub fn new(algo: Algos) -> Self {
        Creatory { algo }
    }

    pub fn make(
        &self,
        salt: Option<&str>,
        tier: Option<Tiers>,
    ) -> Result<Box<dyn Creator>, KERIError> {
        match self.algo {
            Algos::Randy => Ok(Box::new(RandyCreator::new())),
            Algos::Salty => Ok(Box::new(SaltyCreator::new(salt, tier)?)),
        }
    }
}

impl Default for Creatory {
    fn default() -> Self {
        Self::new(Algos::Salty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cesr::{mtr_dex, non_trans_dex};

    #[test]
    fn test_algos() {
        assert_eq!(Algos::Randy.to_string(), "randy");
        assert_eq!(Algos::Salty.to_string(), "salty");
        assert_eq!(Algos::from_str("randy").unwrap(), Algos::Randy);
        assert_eq!(Algos::from_str("SALTY").unwrap(), Algos::Salty);
        assert!(matches!(
            Algos::from_str("novel"),
            Err(KERIError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_randy_creator() {
        let creator = RandyCreator::new();
        assert_eq!(creator.salt(), "");
        assert_eq!(creator.tier(), None);

        let signers = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 0, 0, true, false)
            .unwrap();
        assert_eq!(signers.len(), 1);
        assert_eq!(signers[0].code(), mtr_dex::ED25519_SEED);
        assert_eq!(signers[0].verfer().code(), mtr_dex::ED25519);

        let signers = creator
            .create(None, 2, mtr_dex::ED25519_SEED, 0, 0, false, false)
            .unwrap();
        assert_eq!(signers.len(), 2);
        for signer in &signers {
            assert!(non_trans_dex::TUPLE.contains(&signer.verfer().code()));
        }

        // Fresh entropy per call
        let more = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 0, 0, true, false)
            .unwrap();
        let again = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 0, 0, true, false)
            .unwrap();
        assert_ne!(more[0].qb64(), again[0].qb64());
    }

    #[test]
    fn test_empty_codes_yield_empty_batch() {
        let creator = RandyCreator::new();
        let signers = creator
            .create(Some(vec![]), 0, mtr_dex::ED25519_SEED, 0, 0, true, false)
            .unwrap();
        assert!(signers.is_empty());

        let creator = SaltyCreator::new(None, None).unwrap();
        let signers = creator
            .create(Some(vec![]), 0, mtr_dex::ED25519_SEED, 1, 1, true, true)
            .unwrap();
        assert!(signers.is_empty());
    }

    #[test]
    fn test_salty_creator_deterministic() {
        let salt = Salter::new(Some(b"0123456789abcdef"), None, None)
            .unwrap()
            .qb64();
        assert_eq!(salt, "0AAwMTIzNDU2Nzg5YWJjZGVm");

        let creator = SaltyCreator::new(Some(&salt), None).unwrap();
        assert_eq!(creator.salt(), salt);
        assert_eq!(creator.tier(), Some(Tiers::Low));

        let one = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 0, 0, true, true)
            .unwrap();
        let two = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 0, 0, true, true)
            .unwrap();
        assert_eq!(one[0].qb64(), two[0].qb64());
        assert_eq!(one[0].verfer().qb64(), two[0].verfer().qb64());
    }

    #[test]
    fn test_salty_creator_paths_by_coordinate() {
        let salt = Salter::new(Some(b"0123456789abcdef"), None, None)
            .unwrap()
            .qb64();
        let creator = SaltyCreator::new(Some(&salt), None).unwrap();

        // Batch positions continue the kidx sequence, so one batch of two
        // equals two batches of one at successive kidx
        let batch = creator
            .create(None, 2, mtr_dex::ED25519_SEED, 0, 0, true, true)
            .unwrap();
        let first = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 0, 0, true, true)
            .unwrap();
        let second = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 0, 1, true, true)
            .unwrap();

        assert_eq!(batch[0].qb64(), first[0].qb64());
        assert_eq!(batch[1].qb64(), second[0].qb64());

        // Different rotation index diverges
        let rotated = creator
            .create(None, 1, mtr_dex::ED25519_SEED, 1, 0, true, true)
            .unwrap();
        assert_ne!(rotated[0].qb64(), first[0].qb64());
    }

    #[test]
    fn test_salty_creator_fresh_salt() {
        let creator = SaltyCreator::new(None, None).unwrap();
        assert!(!creator.salt().is_empty());

        let other = SaltyCreator::new(None, None).unwrap();
        assert_ne!(creator.salt(), other.salt());
    }

    #[test]
    fn test_creatory() {
        let creator = Creatory::new(Algos::Randy).make(None, None).unwrap();
        assert!(creator.salt().is_empty());

        let salt = "0AAwMTIzNDU2Nzg5YWJjZGVm";
        let creator = Creatory::new(Algos::Salty)
            .make(Some(salt), Some(Tiers::Low))
            .unwrap();
        assert_eq!(creator.salt(), salt);

        let creator = Creatory::default().make(None, None).unwrap();
        assert!(!creator.salt().is_empty());
    }

    #[test]
    fn test_salty_creator_invalid_salt() {
        assert!(SaltyCreator::new(Some("not-a-salt"), None).is_err());
    }
}
