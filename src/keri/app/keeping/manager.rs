use crate::cesr::diger::Diger;
use crate::cesr::signing::{Sigmat, Signer};
use crate::cesr::verfer::Verfer;
use crate::cesr::{mtr_dex, Tiers};
use crate::keri::app::keeping::creators::{Algos, Creatory};
use crate::keri::app::keeping::keeper::{Keeper, PubLot, PubSit};
use crate::keri::help::helping::nowiso8601;
use crate::keri::KERIError;
use crate::Matter;
use std::collections::HashMap;
use tracing::debug;

/// Manager drives the key lifecycle of identifiers: inception of a key
/// pair sequence, rotation to the pre-committed next key set, relocation
/// of a situation to its canonical prefix, and message signing.
///
/// Secrets live in the keeper's pris store keyed by public key; the
/// in-memory signer cache is scoped to this instance and is invalidated
/// when rotation retires keys. One task per identifier is the contract:
/// the manager is not safe for concurrent mutation of one situation.
pub struct Manager<'db> {
    /// Keystore holding parameters, private keys, and situations
    pub ks: Keeper<'db>,

    /// Cached signers keyed by public key qb64
    signers: HashMap<String, Signer>,
}

impl<'db> Manager<'db> {
    pub fn new(ks: Keeper<'db>) -> Self {
        Manager {
            ks,
            signers: HashMap::new(),
        }
    }

    /// Next prefix sequence number, stored in prms as hex
    pub fn pidx(&self) -> Result<usize, KERIError> {
        match self.ks.prms.get(&["pidx"])? {
            Some(bytes) => {
                let text = String::from_utf8(bytes)
                    .map_err(|_| KERIError::Value("Invalid pidx bytes.".to_string()))?;
                usize::from_str_radix(&text, 16)
                    .map_err(|_| KERIError::Value(format!("Invalid pidx={}.", text)))
            }
            None => Ok(0),
        }
    }

    pub fn set_pidx(&self, pidx: usize) -> Result<(), KERIError> {
        self.ks
            .prms
            .pin(&["pidx"], format!("{:x}", pidx).as_bytes())?;
        Ok(())
    }

    /// Root salt parameter, if one has been stored
    pub fn salt(&self) -> Result<Option<String>, KERIError> {
        match self.ks.prms.get(&["salt"])? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes).map_err(|_| {
                KERIError::Value("Invalid salt bytes.".to_string())
            })?)),
            None => Ok(None),
        }
    }

    pub fn set_salt(&self, salt: &str) -> Result<(), KERIError> {
        self.ks.prms.pin(&["salt"], salt.as_bytes())?;
        Ok(())
    }

    /// Incept a prefix: derive the incepting key set at (ridx=0, kidx=0)
    /// and the next key set at (ridx=1, kidx=icount), commit to the next
    /// set by digest, and file the situation under the first incepting
    /// public key as provisional identifier. Use repre to relocate it to
    /// the canonical prefix once derived.
    ///
    /// When ncount is 0 and ncodes empty the next key set is null and the
    /// identifier is not rotatable.
    ///
    /// Returns the incepting public key verfers and the next key digests.
    #[allow(clippy::too_many_arguments)]
    pub fn incept(
        &mut self,
        icodes: Option<Vec<&str>>,
        icount: Option<usize>,
        icode: Option<&str>,
        ncodes: Option<Vec<&str>>,
        ncount: Option<usize>,
        ncode: Option<&str>,
        dcode: Option<&str>,
        algo: Option<Algos>,
        salt: Option<&str>,
        level: Option<Tiers>,
        transferable: Option<bool>,
        temp: Option<bool>,
    ) -> Result<(Vec<Verfer>, Vec<Diger>), KERIError> {
        let icount = icount.unwrap_or(1);
        let icode = icode.unwrap_or(mtr_dex::ED25519_SEED);
        let ncount = ncount.unwrap_or(1);
        let ncode = ncode.unwrap_or(mtr_dex::ED25519_SEED);
        let dcode = dcode.unwrap_or(mtr_dex::BLAKE3_256);
        let algo = algo.unwrap_or(Algos::Salty);
        let transferable = transferable.unwrap_or(true);
        let temp = temp.unwrap_or(false);

        let ridx = 0usize;
        let kidx = 0usize;

        // A salty creator with no salt generates a fresh one; it is
        // recorded in the situation below so nothing is silently lost
        let creator = Creatory::new(algo).make(salt, level)?;

        let icodes = icodes.unwrap_or_else(|| vec![icode; icount]);
        if icodes.is_empty() {
            return Err(KERIError::Value(
                "Incepting key list may not be empty.".to_string(),
            ));
        }
        let icount = icodes.len();

        let isigners = creator.create(Some(icodes), 0, icode, ridx, kidx, transferable, temp)?;
        let verfers: Vec<Verfer> = isigners.iter().map(|s| s.verfer().clone()).collect();

        let ncodes = ncodes.unwrap_or_else(|| vec![ncode; ncount]);
        let nsigners = creator.create(
            Some(ncodes),
            0,
            ncode,
            ridx + 1,
            kidx + icount,
            transferable,
            temp,
        )?;

        let digers = nsigners
            .iter()
            .map(|signer| Diger::from_ser(&signer.verfer().qb64b(), Some(dcode)))
            .collect::<Result<Vec<Diger>, _>>()?;

        let pidx = self.pidx()?;
        let dt = nowiso8601();
        let ps = PubSit {
            pidx,
            algo: algo.to_string(),
            salt: creator.salt(),
            level: creator.tier().map(|t| t.to_string()).unwrap_or_default(),
            old: PubLot::default(),
            new: PubLot {
                pubs: verfers.iter().map(|v| v.qb64()).collect(),
                ridx,
                kidx,
                dt: dt.clone(),
            },
            nxt: PubLot {
                pubs: nsigners.iter().map(|s| s.verfer().qb64()).collect(),
                ridx: ridx + 1,
                kidx: kidx + icount,
                dt,
            },
        };

        // Use the first public key as provisional prefix
        let pre = verfers[0].qb64();

        // Validate store state before any write
        if self.ks.sits.get(&[pre.as_str()])?.is_some() {
            return Err(KERIError::AlreadyIncepted(pre));
        }

        // Secrets first, situation last, so a partial failure leaves
        // discoverable garbage in pris but never a situation pointing at
        // missing seeds
        for signer in isigners.iter().chain(nsigners.iter()) {
            self.ks.pris.put(&[&signer.verfer().qb64b()], signer)?;
        }

        if !self.ks.sits.put(&[pre.as_str()], &ps)? {
            return Err(KERIError::AlreadyIncepted(pre));
        }

        self.set_pidx(pidx + 1)?;

        for signer in isigners.into_iter().chain(nsigners.into_iter()) {
            self.signers.insert(signer.verfer().qb64(), signer);
        }

        debug!(pre = %pre, algo = %algo, "incepted");
        Ok((verfers, digers))
    }

    /// Rotate the keys of pre: the pre-committed next key set becomes
    /// current, the prior current set becomes old and its predecessor's
    /// secrets are erased, and a new next key set is derived at the
    /// continued keyspace coordinate and committed by digest.
    ///
    /// Returns the now current public key verfers and the new next key
    /// digests.
    pub fn rotate(
        &mut self,
        pre: &str,
        ncodes: Option<Vec<&str>>,
        ncount: Option<usize>,
        ncode: Option<&str>,
        dcode: Option<&str>,
        transferable: Option<bool>,
        temp: Option<bool>,
    ) -> Result<(Vec<Verfer>, Vec<Diger>), KERIError> {
        let ps = self
            .ks
            .sits
            .get(&[pre])?
            .ok_or_else(|| KERIError::UnknownPrefix(pre.to_string()))?;

        self.rotate_sit(pre, ps, ncodes, ncount, ncode, dcode, transferable, temp)
    }

    /// Advance a loaded situation. Split from rotate so the write back
    /// races only against deletions that happen after the load.
    #[allow(clippy::too_many_arguments)]
    fn rotate_sit(
        &mut self,
        pre: &str,
        mut ps: PubSit,
        ncodes: Option<Vec<&str>>,
        ncount: Option<usize>,
        ncode: Option<&str>,
        dcode: Option<&str>,
        transferable: Option<bool>,
        temp: Option<bool>,
    ) -> Result<(Vec<Verfer>, Vec<Diger>), KERIError> {
        let ncount = ncount.unwrap_or(1);
        let ncode = ncode.unwrap_or(mtr_dex::ED25519_SEED);
        let dcode = dcode.unwrap_or(mtr_dex::BLAKE3_256);
        let transferable = transferable.unwrap_or(true);
        let temp = temp.unwrap_or(false);

        // Empty next key set marks a non rotatable identifier
        if ps.nxt.pubs.is_empty() {
            return Err(KERIError::NonTransferable(pre.to_string()));
        }

        // Save prior old for cleanup once the write back succeeds
        let old = ps.old.clone();
        ps.old = ps.new.clone();
        ps.new = ps.nxt.clone();

        // Rebuild verfers for the now current key set, cache first
        let mut verfers = Vec::with_capacity(ps.new.pubs.len());
        for pub_key in &ps.new.pubs {
            if let Some(signer) = self.signers.get(pub_key) {
                verfers.push(signer.verfer().clone());
                continue;
            }

            let signer = self
                .ks
                .pris
                .get(&[pub_key.as_bytes()])?
                .ok_or_else(|| KERIError::MissingSecret(pub_key.clone()))?;
            verfers.push(signer.verfer().clone());
            self.signers.insert(pub_key.clone(), signer);
        }

        // Deterministic continuation of the keyspace
        let algo = Algos::from_str(&ps.algo)?;
        let salt = if ps.salt.is_empty() {
            None
        } else {
            Some(ps.salt.as_str())
        };
        let level = if ps.level.is_empty() {
            None
        } else {
            Some(Tiers::from_str(&ps.level)?)
        };
        let creator = Creatory::new(algo).make(salt, level)?;

        let ridx = ps.new.ridx + 1;
        let kidx = ps.nxt.kidx + ps.new.pubs.len();

        let ncodes = ncodes.unwrap_or_else(|| vec![ncode; ncount]);
        let nsigners = creator.create(Some(ncodes), 0, ncode, ridx, kidx, transferable, temp)?;

        let digers = nsigners
            .iter()
            .map(|signer| Diger::from_ser(&signer.verfer().qb64b(), Some(dcode)))
            .collect::<Result<Vec<Diger>, _>>()?;

        let dt = nowiso8601();
        ps.nxt = PubLot {
            pubs: nsigners.iter().map(|s| s.verfer().qb64()).collect(),
            ridx,
            kidx,
            dt,
        };

        // Secrets first so the situation never references absent seeds,
        // then write back only while the prefix is still present
        for signer in &nsigners {
            self.ks.pris.put(&[&signer.verfer().qb64b()], signer)?;
        }

        if !self.ks.sits.update(&[pre], &ps)? {
            return Err(KERIError::PrefixVanished(pre.to_string()));
        }

        // Retire the stale key set from pris and the cache
        for pub_key in &old.pubs {
            self.ks.pris.rem(&[pub_key.as_bytes()])?;
            self.signers.remove(pub_key);
        }

        for signer in nsigners {
            self.signers.insert(signer.verfer().qb64(), signer);
        }

        debug!(pre = %pre, ridx = ridx, "rotated");
        Ok((verfers, digers))
    }

    /// Relocate the situation filed under the provisional prefix old to
    /// the canonical prefix new. Private key entries are unaffected since
    /// they are keyed by public key. Moving a prefix onto itself is a
    /// no op, which makes the relocation idempotent.
    pub fn repre(&mut self, old: &str, new: &str) -> Result<(), KERIError> {
        if old == new {
            return Ok(());
        }

        let sit = self
            .ks
            .sits
            .get(&[old])?
            .ok_or_else(|| KERIError::UnknownPrefix(old.to_string()))?;

        if !self.ks.sits.put(&[new], &sit)? {
            return Err(KERIError::AlreadyIncepted(new.to_string()));
        }
        self.ks.sits.rem(&[old])?;

        debug!(old = %old, new = %new, "relocated situation");
        Ok(())
    }

    /// Sign ser with the private keys of the given public keys, resolved
    /// through the cache or pris. Indexed (default) returns Sigers whose
    /// index is the position in pubs; unindexed returns Cigars.
    pub fn sign(
        &mut self,
        ser: &[u8],
        pubs: &[String],
        indexed: Option<bool>,
    ) -> Result<Vec<Sigmat>, KERIError> {
        let indexed = indexed.unwrap_or(true);

        let mut sigs = Vec::with_capacity(pubs.len());
        for (i, pub_key) in pubs.iter().enumerate() {
            let signer = match self.signers.get(pub_key) {
                Some(signer) => signer.clone(),
                None => {
                    let signer = self
                        .ks
                        .pris
                        .get(&[pub_key.as_bytes()])?
                        .ok_or_else(|| KERIError::MissingSecret(pub_key.clone()))?;
                    self.signers.insert(pub_key.clone(), signer.clone());
                    signer
                }
            };

            let index = if indexed { Some(i as u32) } else { None };
            sigs.push(signer.sign(ser, index, None, None)?);
        }

        Ok(sigs)
    }

    /// True when the signer cache holds the given public key. Exposed for
    /// inspection in tests and audits.
    pub fn cached(&self, pub_key: &str) -> bool {
        self.signers.contains_key(pub_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keri::db::dbing::LMDBer;
    use std::sync::Arc;

    const SALT: &str = "0AAwMTIzNDU2Nzg5YWJjZGVm";

    fn incept_salty(
        manager: &mut Manager,
        icount: usize,
        ncount: usize,
    ) -> (Vec<Verfer>, Vec<Diger>) {
        manager
            .incept(
                None,
                Some(icount),
                None,
                None,
                Some(ncount),
                None,
                None,
                Some(Algos::Salty),
                Some(SALT),
                Some(Tiers::Low),
                Some(true),
                Some(true),
            )
            .unwrap()
    }

    #[test]
    fn test_incept_salty_deterministic() {
        let lmdber = LMDBer::builder()
            .name("test_manager_incept")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, digers) = incept_salty(&mut manager, 1, 1);
        assert_eq!(verfers.len(), 1);
        assert_eq!(digers.len(), 1);

        // Same salt in a fresh store reproduces the same key pairs
        let lmdber2 = LMDBer::builder()
            .name("test_manager_incept2")
            .temp(true)
            .build()
            .unwrap();
        let mut manager2 = Manager::new(Keeper::new(Arc::new(&lmdber2)).unwrap());
        let (verfers2, digers2) = incept_salty(&mut manager2, 1, 1);

        assert_eq!(verfers[0].qb64(), verfers2[0].qb64());
        assert_eq!(digers[0].qb64(), digers2[0].qb64());

        // The situation is filed under the first public key with the
        // derivation parameters visible
        let pre = verfers[0].qb64();
        let sit = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert_eq!(sit.algo, "salty");
        assert_eq!(sit.salt, SALT);
        assert_eq!(sit.level, "low");
        assert_eq!(sit.new.pubs, vec![pre.clone()]);
        assert_eq!(sit.new.ridx, 0);
        assert_eq!(sit.new.kidx, 0);
        assert_eq!(sit.nxt.ridx, 1);
        assert_eq!(sit.nxt.kidx, 1);
        assert!(!sit.nxt.pubs.is_empty());
        assert!(sit.old.pubs.is_empty());

        // The returned digest commits to the next public key
        assert!(digers[0].verify(sit.nxt.pubs[0].as_bytes()));

        // Every listed key has its secret in pris
        for pub_key in sit.new.pubs.iter().chain(sit.nxt.pubs.iter()) {
            assert!(manager
                .ks
                .pris
                .get(&[pub_key.as_bytes()])
                .unwrap()
                .is_some());
            assert!(manager.cached(pub_key));
        }
    }

    #[test]
    fn test_incept_fresh_salt_recorded() {
        let lmdber = LMDBer::builder()
            .name("test_manager_fresh_salt")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, _) = manager
            .incept(
                None,
                None,
                None,
                None,
                None,
                None,
                None,
                Some(Algos::Salty),
                None, // no salt provided
                Some(Tiers::Low),
                Some(true),
                Some(true),
            )
            .unwrap();

        let sit = manager
            .ks
            .sits
            .get(&[verfers[0].qb64().as_str()])
            .unwrap()
            .unwrap();
        assert!(sit.salt.starts_with("0A"));
        assert_eq!(sit.salt.len(), 24);
    }

    #[test]
    fn test_incept_double_fails() {
        let lmdber = LMDBer::builder()
            .name("test_manager_double")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        incept_salty(&mut manager, 1, 1);
        let pris_before = manager.ks.pris.cnt_all().unwrap();

        let result = manager.incept(
            None,
            Some(1),
            None,
            None,
            Some(1),
            None,
            None,
            Some(Algos::Salty),
            Some(SALT),
            Some(Tiers::Low),
            Some(true),
            Some(true),
        );
        assert!(matches!(result, Err(KERIError::AlreadyIncepted(_))));
        assert_eq!(manager.ks.pris.cnt_all().unwrap(), pris_before);
    }

    #[test]
    fn test_rotate_advances_coordinates() {
        let lmdber = LMDBer::builder()
            .name("test_manager_rotate")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, digers) = incept_salty(&mut manager, 1, 1);
        let pre = verfers[0].qb64();

        let (rverfers, rdigers) = manager
            .rotate(&pre, None, Some(1), None, None, Some(true), Some(true))
            .unwrap();

        // The now current key is the pre-image of the inception commitment
        assert_eq!(rverfers.len(), 1);
        assert!(digers[0].verify(&rverfers[0].qb64b()));
        assert_eq!(rdigers.len(), 1);

        let sit = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert_eq!(sit.new.pubs, vec![rverfers[0].qb64()]);
        assert_eq!(sit.new.ridx, 1);
        assert_eq!(sit.old.pubs, vec![pre.clone()]);
        assert_eq!(sit.nxt.ridx, 2);
        assert_eq!(sit.nxt.kidx, 2);

        // Current and next keys are backed by secrets
        for pub_key in sit.new.pubs.iter().chain(sit.nxt.pubs.iter()) {
            assert!(manager
                .ks
                .pris
                .get(&[pub_key.as_bytes()])
                .unwrap()
                .is_some());
        }
    }

    #[test]
    fn test_salty_kidx_running_total() {
        let lmdber = LMDBer::builder()
            .name("test_manager_kidx")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, _) = incept_salty(&mut manager, 2, 2);
        let pre = verfers[0].qb64();

        let sit = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert_eq!(sit.new.kidx, 0);
        assert_eq!(sit.nxt.kidx, 2);

        manager
            .rotate(&pre, None, Some(2), None, None, Some(true), Some(true))
            .unwrap();
        let sit = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert_eq!(sit.new.kidx, 2);
        assert_eq!(sit.nxt.ridx, 2);
        assert_eq!(sit.nxt.kidx, 4);

        manager
            .rotate(&pre, None, Some(2), None, None, Some(true), Some(true))
            .unwrap();
        let sit = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert_eq!(sit.nxt.ridx, 3);
        assert_eq!(sit.nxt.kidx, 6);
    }

    #[test]
    fn test_rotate_cleanup_erases_stale_secrets() {
        let lmdber = LMDBer::builder()
            .name("test_manager_cleanup")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, _) = incept_salty(&mut manager, 1, 1);
        let pre = verfers[0].qb64();

        // First rotation retires nothing: prior old was empty
        manager
            .rotate(&pre, None, Some(1), None, None, Some(true), Some(true))
            .unwrap();
        assert!(manager.ks.pris.get(&[pre.as_bytes()]).unwrap().is_some());
        assert!(manager.cached(&pre));

        // Second rotation erases the inception keys from pris and cache
        manager
            .rotate(&pre, None, Some(1), None, None, Some(true), Some(true))
            .unwrap();
        assert!(manager.ks.pris.get(&[pre.as_bytes()]).unwrap().is_none());
        assert!(!manager.cached(&pre));
    }

    #[test]
    fn test_rotate_nontransferable_fails() {
        let lmdber = LMDBer::builder()
            .name("test_manager_nontrans")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, digers) = manager
            .incept(
                None,
                Some(1),
                None,
                None,
                Some(0), // null next key set
                None,
                None,
                Some(Algos::Salty),
                Some(SALT),
                Some(Tiers::Low),
                Some(true),
                Some(true),
            )
            .unwrap();
        assert!(digers.is_empty());

        let pre = verfers[0].qb64();
        let sit = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert!(sit.nxt.pubs.is_empty());

        let result = manager.rotate(&pre, None, Some(1), None, None, Some(true), Some(true));
        assert!(matches!(result, Err(KERIError::NonTransferable(_))));
    }

    #[test]
    fn test_rotate_unknown_prefix_fails() {
        let lmdber = LMDBer::builder()
            .name("test_manager_unknown")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let result = manager.rotate(
            "BGlOiUdp5sMmfotHfCWQKEzWR91C72AH0lT84c0um-Qj",
            None,
            Some(1),
            None,
            None,
            Some(true),
            Some(true),
        );
        assert!(matches!(result, Err(KERIError::UnknownPrefix(_))));
    }

    #[test]
    fn test_rotate_vanished_prefix_fails() {
        let lmdber = LMDBer::builder()
            .name("test_manager_vanished")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, _) = incept_salty(&mut manager, 1, 1);
        let pre = verfers[0].qb64();

        // The sits record is deleted out from under a rotation in flight:
        // load the situation, remove the record, then advance. The
        // present-only write back detects the vanished prefix.
        let ps = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert!(manager.ks.sits.rem(&[pre.as_str()]).unwrap());

        let result =
            manager.rotate_sit(&pre, ps, None, Some(1), None, None, Some(true), Some(true));
        assert!(matches!(result, Err(KERIError::PrefixVanished(_))));
        assert!(manager.ks.sits.get(&[pre.as_str()]).unwrap().is_none());

        // A prefix already absent at entry reports UnknownPrefix instead
        let result = manager.rotate(&pre, None, Some(1), None, None, Some(true), Some(true));
        assert!(matches!(result, Err(KERIError::UnknownPrefix(_))));
    }

    #[test]
    fn test_rotate_missing_secret_leaves_situation_untouched() {
        let lmdber = LMDBer::builder()
            .name("test_manager_missing")
            .temp(true)
            .build()
            .unwrap();

        let pre = {
            let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());
            let (verfers, _) = incept_salty(&mut manager, 1, 1);
            verfers[0].qb64()
        };

        // A fresh manager has a cold cache so the secret must come from
        // pris, which we sabotage
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());
        let sit_before = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();

        let nxt_pub = sit_before.nxt.pubs[0].clone();
        assert!(manager.ks.pris.rem(&[nxt_pub.as_bytes()]).unwrap());

        let result = manager.rotate(&pre, None, Some(1), None, None, Some(true), Some(true));
        assert!(matches!(result, Err(KERIError::MissingSecret(_))));

        let sit_after = manager.ks.sits.get(&[pre.as_str()]).unwrap().unwrap();
        assert_eq!(sit_after, sit_before);
    }

    #[test]
    fn test_repre_moves_situation() {
        let lmdber = LMDBer::builder()
            .name("test_manager_repre")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, _) = incept_salty(&mut manager, 1, 1);
        let provisional = verfers[0].qb64();
        let canonical = "EH7Oq9oxCgYa-nnNLvwhp9sFZpALILlRYyB-6n4WDi7w";

        manager.repre(&provisional, canonical).unwrap();
        assert!(manager
            .ks
            .sits
            .get(&[provisional.as_str()])
            .unwrap()
            .is_none());
        let sit = manager.ks.sits.get(&[canonical]).unwrap().unwrap();
        assert_eq!(sit.new.pubs, vec![provisional.clone()]);

        // Secrets stay keyed by public key
        assert!(manager
            .ks
            .pris
            .get(&[provisional.as_bytes()])
            .unwrap()
            .is_some());

        // Idempotent: relocating a prefix onto itself is a no op
        manager.repre(canonical, canonical).unwrap();
        assert!(manager.ks.sits.get(&[canonical]).unwrap().is_some());

        // The provisional key is gone now
        let result = manager.repre(&provisional, canonical);
        assert!(matches!(result, Err(KERIError::UnknownPrefix(_))));

        // A second situation may not clobber the canonical slot
        let mut manager2 = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());
        let (verfers2, _) = manager2
            .incept(
                None,
                Some(1),
                None,
                None,
                Some(1),
                None,
                None,
                Some(Algos::Randy),
                None,
                None,
                Some(true),
                Some(true),
            )
            .unwrap();
        let result = manager2.repre(&verfers2[0].qb64(), canonical);
        assert!(matches!(result, Err(KERIError::AlreadyIncepted(_))));
    }

    #[test]
    fn test_sign_indexed_and_unindexed() {
        let lmdber = LMDBer::builder()
            .name("test_manager_sign")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        let (verfers, _) = incept_salty(&mut manager, 2, 1);
        let pubs: Vec<String> = verfers.iter().map(|v| v.qb64()).collect();
        let ser = b"serialized event to sign";

        let sigs = manager.sign(ser, &pubs, None).unwrap();
        assert_eq!(sigs.len(), 2);
        for (i, sig) in sigs.iter().enumerate() {
            match sig {
                Sigmat::Indexed(siger) => {
                    assert_eq!(siger.index(), i as u32);
                    assert!(verfers[i].verify(siger.raw(), ser).unwrap());
                }
                Sigmat::NonIndexed(_) => panic!("expected indexed signature"),
            }
        }

        let sigs = manager.sign(ser, &pubs, Some(false)).unwrap();
        match &sigs[0] {
            Sigmat::NonIndexed(cigar) => {
                assert!(verfers[0].verify(cigar.raw(), ser).unwrap());
            }
            Sigmat::Indexed(_) => panic!("expected unindexed signature"),
        }

        // Unknown public key has no secret
        let result = manager.sign(
            ser,
            &["BGlOiUdp5sMmfotHfCWQKEzWR91C72AH0lT84c0um-Qj".to_string()],
            None,
        );
        assert!(matches!(result, Err(KERIError::MissingSecret(_))));
    }

    #[test]
    fn test_sign_resolves_through_pris_after_restart() {
        let lmdber = LMDBer::builder()
            .name("test_manager_sign_cold")
            .temp(true)
            .build()
            .unwrap();

        let pubs = {
            let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());
            let (verfers, _) = incept_salty(&mut manager, 1, 1);
            vec![verfers[0].qb64()]
        };

        // Fresh manager, cold cache: signer reloads from pris
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());
        assert!(!manager.cached(&pubs[0]));

        let sigs = manager.sign(b"after restart", &pubs, None).unwrap();
        assert_eq!(sigs.len(), 1);
        assert!(manager.cached(&pubs[0]));
    }

    #[test]
    fn test_pidx_advances_per_inception() {
        let lmdber = LMDBer::builder()
            .name("test_manager_pidx")
            .temp(true)
            .build()
            .unwrap();
        let mut manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        assert_eq!(manager.pidx().unwrap(), 0);

        let (verfers, _) = incept_salty(&mut manager, 1, 1);
        assert_eq!(manager.pidx().unwrap(), 1);
        let sit = manager
            .ks
            .sits
            .get(&[verfers[0].qb64().as_str()])
            .unwrap()
            .unwrap();
        assert_eq!(sit.pidx, 0);

        let (verfers2, _) = manager
            .incept(
                None,
                Some(1),
                None,
                None,
                Some(1),
                None,
                None,
                Some(Algos::Randy),
                None,
                None,
                Some(true),
                Some(true),
            )
            .unwrap();
        assert_eq!(manager.pidx().unwrap(), 2);
        let sit = manager
            .ks
            .sits
            .get(&[verfers2[0].qb64().as_str()])
            .unwrap()
            .unwrap();
        assert_eq!(sit.pidx, 1);
        assert_eq!(sit.algo, "randy");
        assert_eq!(sit.salt, "");
    }

    #[test]
    fn test_root_salt_param_round_trip() {
        let lmdber = LMDBer::builder()
            .name("test_manager_salt_param")
            .temp(true)
            .build()
            .unwrap();
        let manager = Manager::new(Keeper::new(Arc::new(&lmdber)).unwrap());

        assert!(manager.salt().unwrap().is_none());
        manager.set_salt(SALT).unwrap();
        assert_eq!(manager.salt().unwrap().unwrap(), SALT);
    }
}
