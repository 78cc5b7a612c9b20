use crate::cesr::counting::ctr_dex;
use crate::cesr::diger::Diger;
use crate::cesr::number::Number;
use crate::cesr::prefixer::Prefixer;
use crate::cesr::Parsable;
use crate::errors::MatterError;
use crate::Matter;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Field kinds a seal structure may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealKind {
    Prefixer,
    Number,
    Diger,
}

/// Clan is a registered seal schema: a name plus an ordered field layout
/// of (label, kind) pairs.
#[derive(Debug, Clone, Copy)]
pub struct Clan {
    pub name: &'static str,
    pub labels: &'static [(&'static str, SealKind)],
}

/// Registry of seal clans keyed by the counter code that frames them.
pub static CLANS: Lazy<HashMap<&'static str, Clan>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(
        ctr_dex::SEAL_SOURCE_COUPLES,
        Clan {
            name: "SealTrans",
            labels: &[("s", SealKind::Number), ("d", SealKind::Diger)],
        },
    );
    map.insert(
        ctr_dex::SEAL_SOURCE_TRIPLES,
        Clan {
            name: "SealEvent",
            labels: &[
                ("i", SealKind::Prefixer),
                ("s", SealKind::Number),
                ("d", SealKind::Diger),
            ],
        },
    );
    map.insert(
        ctr_dex::DIGEST_SEAL_SINGLES,
        Clan {
            name: "SealDigest",
            labels: &[("d", SealKind::Diger)],
        },
    );
    map.insert(
        ctr_dex::MERKLE_ROOT_SEAL_SINGLES,
        Clan {
            name: "SealRoot",
            labels: &[("rd", SealKind::Diger)],
        },
    );
    map.insert(
        ctr_dex::BACKER_REGISTRAR_SEAL_COUPLES,
        Clan {
            name: "SealBack",
            labels: &[("bi", SealKind::Prefixer), ("d", SealKind::Diger)],
        },
    );
    map.insert(
        ctr_dex::SEAL_SOURCE_LAST_SINGLES,
        Clan {
            name: "SealLast",
            labels: &[("i", SealKind::Prefixer)],
        },
    );
    map
});

/// Sealer is one typed seal structure read off a stream by consulting a
/// clan for its field layout.
#[derive(Debug, Clone)]
pub struct Sealer {
    clan: Clan,
    qb64: String,
    crew: Vec<(&'static str, String)>,
}

impl Sealer {
    /// Decode one seal of the given clan from the front of a qb64 stream.
    pub fn from_stream(
        clan: Clan,
        data: &mut Vec<u8>,
        strip: Option<bool>,
    ) -> Result<Self, MatterError> {
        let strip = strip.unwrap_or(false);
        let mut working = data.clone();
        let mut qb64 = String::new();
        let mut crew = Vec::with_capacity(clan.labels.len());

        for (label, kind) in clan.labels {
            let value = match kind {
                SealKind::Prefixer => {
                    let prefixer = Prefixer::from_qb64b(&mut working, Some(true))?;
                    qb64.push_str(&prefixer.qb64());
                    prefixer.qb64()
                }
                SealKind::Number => {
                    let number = Number::from_qb64b(&mut working, Some(true))?;
                    qb64.push_str(&number.qb64());
                    number.snh()
                }
                SealKind::Diger => {
                    let diger = Diger::from_qb64b(&mut working, Some(true))?;
                    qb64.push_str(&diger.qb64());
                    diger.qb64()
                }
            };
            crew.push((*label, value));
        }

        if strip {
            let consumed = data.len() - working.len();
            data.drain(..consumed);
        }

        Ok(Sealer { clan, qb64, crew })
    }

    pub fn name(&self) -> &'static str {
        self.clan.name
    }

    /// Concatenated qb64 of the seal's field primitives
    pub fn qb64(&self) -> &str {
        &self.qb64
    }

    /// Field labels paired with their rendered values, in layout order
    pub fn crew(&self) -> &[(&'static str, String)] {
        &self.crew
    }
}
