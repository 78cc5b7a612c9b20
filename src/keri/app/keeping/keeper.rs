use crate::keri::db::dbing::LMDBer;
use crate::keri::db::errors::DBError;
use crate::keri::db::koming::{Komer, SerialKind};
use crate::keri::db::subing::signer::SignerSuber;
use crate::keri::db::subing::Suber;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// One committed key set in the lifetime of an identifier: the public
/// keys plus the coordinates they were derived at.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PubLot {
    /// Fully qualified Base64 public keys, possibly empty
    #[serde(default)]
    pub pubs: Vec<String>,

    /// Rotation index of this key set, 0 at inception
    #[serde(default)]
    pub ridx: usize,

    /// Starting key index of this set within the derivation keyspace
    #[serde(default)]
    pub kidx: usize,

    /// ISO-8601 UTC datetime the key set was created
    #[serde(default)]
    pub dt: String,
}

/// The complete key rotation situation for one identifier: the old,
/// current, and pre-committed next key sets plus derivation parameters.
///
/// Serialized as compact JSON with struct order keys. Deserialization
/// overlays present fields onto defaults, so records written by older
/// layouts still load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PubSit {
    /// Prefix sequence number of this key pair sequence
    #[serde(default)]
    pub pidx: usize,

    /// Key creation algorithm, "randy" or "salty"
    #[serde(default)]
    pub algo: String,

    /// qb64 root salt for the salty algorithm, empty for randy
    #[serde(default)]
    pub salt: String,

    /// Stretch security level for the salty algorithm
    #[serde(default)]
    pub level: String,

    /// Prior current key set, may be discarded
    #[serde(default)]
    pub old: PubLot,

    /// Currently authoritative key set
    #[serde(default)]
    pub new: PubLot,

    /// Pre-committed next key set, only its digests are public
    #[serde(default)]
    pub nxt: PubLot,
}

/// Keeper sets up the named sub databases for key pair storage:
///
/// * prms: parameter label -> value bytes (root salt, next prefix index)
/// * pris: public key qb64 -> private key seed qb64
/// * sits: identifier prefix qb64 -> serialized PubSit
///
/// Sub database names end with '.' (a non Base64 byte) so they cannot
/// collide with identifier prefixes used as keys elsewhere.
pub struct Keeper<'db> {
    lmdber: Arc<&'db LMDBer>,

    /// Parameters for the whole keystore
    pub prms: Suber<'db>,

    /// Private keys keyed by public key
    pub pris: SignerSuber<'db>,

    /// Key situations keyed by identifier prefix
    pub sits: Komer<'db, PubSit>,
}

impl<'db> Keeper<'db> {
    pub fn new(lmdber: Arc<&'db LMDBer>) -> Result<Self, DBError> {
        let keeper = Keeper {
            lmdber: lmdber.clone(),
            prms: Suber::new(lmdber.clone(), "prms.", None)
                .map_err(|e| DBError::DatabaseError(format!("{}", e)))?,
            pris: SignerSuber::new(lmdber.clone(), "pris.", None)
                .map_err(|e| DBError::DatabaseError(format!("{}", e)))?,
            sits: Komer::new(lmdber.clone(), "sits.", SerialKind::Json)?,
        };

        Ok(keeper)
    }

    pub fn opened(&self) -> bool {
        self.lmdber.opened()
    }

    pub fn name(&self) -> String {
        self.lmdber.name()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lmdber.path()
    }

    pub fn temp(&self) -> bool {
        self.lmdber.temp()
    }
}
