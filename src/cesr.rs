use crate::errors::MatterError;
use base64::{engine::general_purpose, Engine};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::str;

pub mod cigar;
pub mod counting;
pub mod diger;
pub mod ilker;
pub mod indexing;
pub mod number;
pub mod prefixer;
pub mod signing;
pub mod tholder;
pub mod traitor;
pub mod verfer;
pub mod verser;

/// Maps Base64 URL-safe index to corresponding character
pub static B64_CHR_BY_IDX: Lazy<HashMap<u8, char>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // A-Z: indices 0-25
    for (idx, c) in (b'A'..=b'Z').enumerate() {
        map.insert(idx as u8, c as char);
    }

    // a-z: indices 26-51
    for (idx, c) in (b'a'..=b'z').enumerate() {
        map.insert((idx + 26) as u8, c as char);
    }

    // 0-9: indices 52-61
    for (idx, c) in (b'0'..=b'9').enumerate() {
        map.insert((idx + 52) as u8, c as char);
    }

    map.insert(62, '-');
    map.insert(63, '_');

    map
});

/// Derivation codes for Matter primitives
#[allow(dead_code)]
pub mod mtr_dex {
    pub const ED25519_SEED: &str = "A"; // Ed25519 256 bit random seed for private key
    pub const ED25519N: &str = "B"; // Ed25519 verification key non-transferable, basic derivation
    pub const X25519: &str = "C"; // X25519 public encryption key
    pub const ED25519: &str = "D"; // Ed25519 verification key basic derivation
    pub const BLAKE3_256: &str = "E"; // Blake3 256 bit digest self-addressing derivation
    pub const BLAKE2B_256: &str = "F"; // Blake2b 256 bit digest self-addressing derivation
    pub const BLAKE2S_256: &str = "G"; // Blake2s 256 bit digest self-addressing derivation
    pub const SHA3_256: &str = "H"; // SHA3 256 bit digest self-addressing derivation
    pub const SHA2_256: &str = "I"; // SHA2 256 bit digest self-addressing derivation
    pub const ECDSA_256K1_SEED: &str = "J"; // ECDSA secp256k1 256 bit random seed for private key
    pub const SHORT: &str = "M"; // Short 2 byte b2 number
    pub const BIG: &str = "N"; // Big 8 byte b2 number
    pub const ECDSA_256R1_SEED: &str = "Q"; // ECDSA secp256r1 256 bit random seed for private key
    pub const TAG3: &str = "X"; // Tag3 3 B64 encoded chars for special values
    pub const TAG7: &str = "Y"; // Tag7 7 B64 encoded chars for special values
    pub const SALT_128: &str = "0A"; // Random salt/seed/nonce of length 128 bits
    pub const ED25519_SIG: &str = "0B"; // Ed25519 signature
    pub const ECDSA_256K1_SIG: &str = "0C"; // ECDSA secp256k1 signature
    pub const BLAKE3_512: &str = "0D"; // Blake3 512 bit digest self-addressing derivation
    pub const SHA3_512: &str = "0F"; // SHA3 512 bit digest self-addressing derivation
    pub const SHA2_512: &str = "0G"; // SHA2 512 bit digest self-addressing derivation
    pub const LONG: &str = "0H"; // Long 4 byte b2 number
    pub const ECDSA_256R1_SIG: &str = "0I"; // ECDSA secp256r1 signature
    pub const TAG1: &str = "0J"; // Tag1 1 B64 encoded char + 1 prepad for special values
    pub const TAG2: &str = "0K"; // Tag2 2 B64 encoded chars for special values
    pub const TAG5: &str = "0L"; // Tag5 5 B64 encoded chars + 1 prepad for special values
    pub const TAG6: &str = "0M"; // Tag6 6 B64 encoded chars for special values
    pub const ECDSA_256K1N: &str = "1AAA"; // ECDSA secp256k1 verification key non-transferable
    pub const ECDSA_256K1: &str = "1AAB"; // ECDSA secp256k1 verification key, basic derivation
    pub const TAG4: &str = "1AAF"; // Tag4 4 B64 encoded chars for special values
    pub const DATE_TIME: &str = "1AAG"; // Base64 custom encoded 32 char ISO-8601 DateTime
    pub const ECDSA_256R1N: &str = "1AAI"; // ECDSA secp256r1 verification key non-transferable
    pub const ECDSA_256R1: &str = "1AAJ"; // ECDSA secp256r1 verification key, basic derivation
    pub const NULL: &str = "1AAK"; // Null None or empty value
    pub const TAG8: &str = "1AAN"; // Tag8 8 B64 encoded chars for special values
    pub const STR_B64_L0: &str = "4A"; // String Base64 only lead size 0
    pub const STR_B64_L1: &str = "5A"; // String Base64 only lead size 1
    pub const STR_B64_L2: &str = "6A"; // String Base64 only lead size 2
    pub const BYTES_L0: &str = "4B"; // Byte string lead size 0
    pub const BYTES_L1: &str = "5B"; // Byte string lead size 1
    pub const BYTES_L2: &str = "6B"; // Byte string lead size 2
}

/// Codex of all digest derivation codes.
/// Only provides defined codes so that inclusion via contains works.
pub mod dig_dex {
    pub const BLAKE3_256: &str = "E";
    pub const BLAKE2B_256: &str = "F";
    pub const BLAKE2S_256: &str = "G";
    pub const SHA3_256: &str = "H";
    pub const SHA2_256: &str = "I";
    pub const BLAKE3_512: &str = "0D";
    pub const SHA3_512: &str = "0F";
    pub const SHA2_512: &str = "0G";

    pub static TUPLE: [&str; 8] = [
        BLAKE3_256,
        BLAKE2B_256,
        BLAKE2S_256,
        SHA3_256,
        SHA2_256,
        BLAKE3_512,
        SHA3_512,
        SHA2_512,
    ];
}

/// Codex of all non-transferable derivation codes.
pub mod non_trans_dex {
    pub const ED25519N: &str = "B";
    pub const ECDSA_256K1N: &str = "1AAA";
    pub const ECDSA_256R1N: &str = "1AAI";

    pub static TUPLE: [&str; 3] = [ED25519N, ECDSA_256K1N, ECDSA_256R1N];
}

/// Codex of all identifier prefix derivation codes.
/// Needed to recognize valid AID prefixes in streams and stores.
pub mod pre_dex {
    pub const ED25519N: &str = "B";
    pub const ED25519: &str = "D";
    pub const BLAKE3_256: &str = "E";
    pub const BLAKE2B_256: &str = "F";
    pub const BLAKE2S_256: &str = "G";
    pub const SHA3_256: &str = "H";
    pub const SHA2_256: &str = "I";
    pub const BLAKE3_512: &str = "0D";
    pub const SHA3_512: &str = "0F";
    pub const SHA2_512: &str = "0G";
    pub const ECDSA_256K1N: &str = "1AAA";
    pub const ECDSA_256K1: &str = "1AAB";
    pub const ECDSA_256R1N: &str = "1AAI";
    pub const ECDSA_256R1: &str = "1AAJ";

    pub static TUPLE: [&str; 14] = [
        ED25519N,
        ED25519,
        BLAKE3_256,
        BLAKE2B_256,
        BLAKE2S_256,
        SHA3_256,
        SHA2_256,
        BLAKE3_512,
        SHA3_512,
        SHA2_512,
        ECDSA_256K1N,
        ECDSA_256K1,
        ECDSA_256R1N,
        ECDSA_256R1,
    ];
}

/// Codex of ordinal number codes, smallest first.
pub mod num_dex {
    pub const SHORT: &str = "M"; // 2 byte b2 number
    pub const LONG: &str = "0H"; // 4 byte b2 number
    pub const BIG: &str = "N"; // 8 byte b2 number

    pub static TUPLE: [&str; 3] = [SHORT, LONG, BIG];
}

/// Codex of variable sized Base64 text codes.
pub mod bex_dex {
    pub const STR_B64_L0: &str = "4A";
    pub const STR_B64_L1: &str = "5A";
    pub const STR_B64_L2: &str = "6A";

    pub static TUPLE: [&str; 3] = [STR_B64_L0, STR_B64_L1, STR_B64_L2];
}

/// Codex of tag codes by tag length in B64 chars, index 0 unused.
pub mod tag_dex {
    pub const TAG1: &str = "0J";
    pub const TAG2: &str = "0K";
    pub const TAG3: &str = "X";
    pub const TAG4: &str = "1AAF";
    pub const TAG5: &str = "0L";
    pub const TAG6: &str = "0M";
    pub const TAG7: &str = "Y";
    pub const TAG8: &str = "1AAN";

    pub static TUPLE: [&str; 8] = [TAG1, TAG2, TAG3, TAG4, TAG5, TAG6, TAG7, TAG8];
}

/// Size information for a derivation code
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sizage {
    pub hs: usize,         // hard size in chars
    pub ss: usize,         // soft size in chars
    pub xs: usize,         // xtra prepad size in chars within soft
    pub fs: Option<usize>, // full size in chars, None when variable sized
    pub ls: usize,         // lead size in bytes
}

fn sz(hs: usize, ss: usize, xs: usize, fs: Option<usize>, ls: usize) -> Sizage {
    Sizage { hs, ss, xs, fs, ls }
}

/// Table of sizes for every supported derivation code
pub static SIZES: Lazy<HashMap<&'static str, Sizage>> = Lazy::new(|| {
    let mut sizes = HashMap::new();

    sizes.insert("A", sz(1, 0, 0, Some(44), 0));
    sizes.insert("B", sz(1, 0, 0, Some(44), 0));
    sizes.insert("C", sz(1, 0, 0, Some(44), 0));
    sizes.insert("D", sz(1, 0, 0, Some(44), 0));
    sizes.insert("E", sz(1, 0, 0, Some(44), 0));
    sizes.insert("F", sz(1, 0, 0, Some(44), 0));
    sizes.insert("G", sz(1, 0, 0, Some(44), 0));
    sizes.insert("H", sz(1, 0, 0, Some(44), 0));
    sizes.insert("I", sz(1, 0, 0, Some(44), 0));
    sizes.insert("J", sz(1, 0, 0, Some(44), 0));
    sizes.insert("M", sz(1, 0, 0, Some(4), 0));
    sizes.insert("N", sz(1, 0, 0, Some(12), 0));
    sizes.insert("Q", sz(1, 0, 0, Some(44), 0));
    sizes.insert("X", sz(1, 3, 0, Some(4), 0));
    sizes.insert("Y", sz(1, 7, 0, Some(8), 0));
    sizes.insert("0A", sz(2, 0, 0, Some(24), 0));
    sizes.insert("0B", sz(2, 0, 0, Some(88), 0));
    sizes.insert("0C", sz(2, 0, 0, Some(88), 0));
    sizes.insert("0D", sz(2, 0, 0, Some(88), 0));
    sizes.insert("0F", sz(2, 0, 0, Some(88), 0));
    sizes.insert("0G", sz(2, 0, 0, Some(88), 0));
    sizes.insert("0H", sz(2, 0, 0, Some(8), 0));
    sizes.insert("0I", sz(2, 0, 0, Some(88), 0));
    sizes.insert("0J", sz(2, 2, 1, Some(4), 0));
    sizes.insert("0K", sz(2, 2, 0, Some(4), 0));
    sizes.insert("0L", sz(2, 6, 1, Some(8), 0));
    sizes.insert("0M", sz(2, 6, 0, Some(8), 0));
    sizes.insert("1AAA", sz(4, 0, 0, Some(48), 0));
    sizes.insert("1AAB", sz(4, 0, 0, Some(48), 0));
    sizes.insert("1AAF", sz(4, 4, 0, Some(8), 0));
    sizes.insert("1AAG", sz(4, 0, 0, Some(36), 0));
    sizes.insert("1AAI", sz(4, 0, 0, Some(48), 0));
    sizes.insert("1AAJ", sz(4, 0, 0, Some(48), 0));
    sizes.insert("1AAK", sz(4, 0, 0, Some(4), 0));
    sizes.insert("1AAN", sz(4, 8, 0, Some(12), 0));
    sizes.insert("4A", sz(2, 2, 0, None, 0));
    sizes.insert("5A", sz(2, 2, 0, None, 1));
    sizes.insert("6A", sz(2, 2, 0, None, 2));
    sizes.insert("4B", sz(2, 2, 0, None, 0));
    sizes.insert("5B", sz(2, 2, 0, None, 1));
    sizes.insert("6B", sz(2, 2, 0, None, 2));

    sizes
});

/// Codex names by code, used for annotation labels
pub static NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("A", "Ed25519_Seed");
    map.insert("B", "Ed25519N");
    map.insert("C", "X25519");
    map.insert("D", "Ed25519");
    map.insert("E", "Blake3_256");
    map.insert("F", "Blake2b_256");
    map.insert("G", "Blake2s_256");
    map.insert("H", "SHA3_256");
    map.insert("I", "SHA2_256");
    map.insert("J", "ECDSA_256k1_Seed");
    map.insert("M", "Short");
    map.insert("N", "Big");
    map.insert("Q", "ECDSA_256r1_Seed");
    map.insert("X", "Tag3");
    map.insert("Y", "Tag7");
    map.insert("0A", "Salt_128");
    map.insert("0B", "Ed25519_Sig");
    map.insert("0C", "ECDSA_256k1_Sig");
    map.insert("0D", "Blake3_512");
    map.insert("0F", "SHA3_512");
    map.insert("0G", "SHA2_512");
    map.insert("0H", "Long");
    map.insert("0I", "ECDSA_256r1_Sig");
    map.insert("0J", "Tag1");
    map.insert("0K", "Tag2");
    map.insert("0L", "Tag5");
    map.insert("0M", "Tag6");
    map.insert("1AAA", "ECDSA_256k1N");
    map.insert("1AAB", "ECDSA_256k1");
    map.insert("1AAF", "Tag4");
    map.insert("1AAG", "DateTime");
    map.insert("1AAI", "ECDSA_256r1N");
    map.insert("1AAJ", "ECDSA_256r1");
    map.insert("1AAK", "Null");
    map.insert("1AAN", "Tag8");
    map.insert("4A", "StrB64_L0");
    map.insert("5A", "StrB64_L1");
    map.insert("6A", "StrB64_L2");
    map.insert("4B", "Bytes_L0");
    map.insert("5B", "Bytes_L1");
    map.insert("6B", "Bytes_L2");
    map
});

/// Map of hard first characters to hard code size in chars.
///
/// Uppercase and lowercase letters select one char codes; digits select
/// two or four char codes by selector convention.
pub fn hards() -> HashMap<u8, usize> {
    let mut map: HashMap<u8, usize> = (b'A'..=b'Z').map(|c| (c, 1)).collect();

    map.extend((b'a'..=b'z').map(|c| (c, 1)));

    map.extend([
        (b'0', 2),
        (b'1', 4),
        (b'2', 4),
        (b'3', 4),
        (b'4', 2),
        (b'5', 2),
        (b'6', 2),
        (b'7', 4),
        (b'8', 4),
        (b'9', 4),
    ]);

    map
}

/// Security levels for the salt stretching KDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tiers {
    Low,
    Mid,
    High,
}

impl std::fmt::Display for Tiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tiers::Low => write!(f, "low"),
            Tiers::Mid => write!(f, "mid"),
            Tiers::High => write!(f, "high"),
        }
    }
}

impl Tiers {
    pub fn from_str(s: &str) -> Result<Self, MatterError> {
        match s {
            "low" => Ok(Tiers::Low),
            "mid" => Ok(Tiers::Mid),
            "high" => Ok(Tiers::High),
            _ => Err(MatterError::Value(format!("Unsupported tier = {}.", s))),
        }
    }
}

/// Protocol version, major and minor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Versionage {
    pub major: u64,
    pub minor: u64,
}

pub const VRSN_1_0: Versionage = Versionage { major: 1, minor: 0 };
pub const VRSN_2_0: Versionage = Versionage { major: 2, minor: 0 };

/// Cold start stream framing classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colds {
    Txt,
    Bny,
}

/// Classify the framing of the next frame in a stream by the first tritet
/// (3 most significant bits) of its first byte.
///
/// Count code and op code starts in the text domain map to `Colds::Txt`,
/// count code starts in the binary domain map to `Colds::Bny`. Anything
/// else is not a start of frame.
pub fn sniff(ims: &[u8]) -> Result<Colds, MatterError> {
    let first = ims
        .first()
        .ok_or_else(|| MatterError::Shortage("Empty stream, need more bytes.".to_string()))?;

    match first >> 5 {
        0b001 | 0b010 => Ok(Colds::Txt),
        0b111 => Ok(Colds::Bny),
        tritet => Err(MatterError::ColdStart(format!(
            "Expecting stream tritet, got {:#05b}.",
            tritet
        ))),
    }
}

/// Matter is the trait for fully qualified cryptographic material.
pub trait Matter {
    /// Returns the hard part of the derivation code
    fn code(&self) -> &str;

    /// Returns the soft part of the full code, empty for most codes
    fn soft(&self) -> &str;

    /// Returns raw crypto material without derivation code
    fn raw(&self) -> &[u8];

    /// Returns base64 fully qualified representation
    fn qb64(&self) -> String;

    /// Returns base64 fully qualified representation as bytes
    fn qb64b(&self) -> Vec<u8>;

    /// Returns binary fully qualified representation
    fn qb2(&self) -> Vec<u8>;

    /// Returns full size of the qb64 representation in chars
    fn full_size(&self) -> usize;

    /// Returns the codex name of the code
    fn name(&self) -> &'static str;

    /// Returns whether the derivation code is transferable
    fn is_transferable(&self) -> bool;

    /// Returns whether the code represents a digest
    fn is_digestive(&self) -> bool;

    /// Returns whether the code may derive an identifier prefix
    fn is_prefixive(&self) -> bool;
}

/// Parsable types can be extracted from the front of a qb64 or qb2 stream.
/// When strip is true the consumed bytes are drained from the stream so the
/// cursor advances primitive by primitive.
pub trait Parsable: Sized {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError>;

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError>;
}

/// Common implementation for all Matter types.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMatter {
    code: String,
    soft: String,
    raw: Vec<u8>,
}

impl BaseMatter {
    /// Create from raw bytes and a derivation code. `rize` gives the raw
    /// size for variable sized codes, otherwise the raw length is used.
    pub fn new(
        raw: Option<&[u8]>,
        code: Option<&str>,
        soft: Option<&str>,
        rize: Option<usize>,
    ) -> Result<Self, MatterError> {
        let code = code.ok_or_else(|| {
            MatterError::EmptyMaterial(
                "Improper initialization, need raw and code or qb64 or qb2.".to_string(),
            )
        })?;

        let size = *SIZES
            .get(code)
            .ok_or_else(|| MatterError::UnsupportedCode(format!("Unsupported code={}", code)))?;

        if size.fs.is_none() {
            // Variable sized code such as StrB64 or Bytes
            let raw = raw.ok_or_else(|| {
                MatterError::EmptyMaterial("Missing raw for variable sized code.".to_string())
            })?;
            let rize = rize.unwrap_or(raw.len());
            if raw.len() < rize {
                return Err(MatterError::RawMaterial(format!(
                    "Not enough raw bytes for code={} expected {} got {}.",
                    code,
                    rize,
                    raw.len()
                )));
            }

            let ls = (3 - (rize % 3)) % 3;
            let triplets = (rize + ls) / 3;
            if triplets > 64 * 64 - 1 {
                return Err(MatterError::InvalidVarRawSize(format!(
                    "Unsupported raw size for code={}.",
                    code
                )));
            }

            // Lead size selects the first selector char of the code
            let selector = match ls {
                0 => "4",
                1 => "5",
                _ => "6",
            };
            let code = format!("{}{}", selector, &code[1..2]);
            let soft = int_to_b64(triplets as u64, 2);

            return Ok(BaseMatter {
                code,
                soft,
                raw: raw[..rize].to_vec(),
            });
        }

        // Fixed size code
        let rize = raw_size(code)?;
        let soft_val = if size.ss > 0 {
            let soft = soft.unwrap_or("");
            if soft.len() < size.ss - size.xs {
                return Err(MatterError::SoftMaterial(format!(
                    "Not enough chars in soft={} with ss={} xs={} for code={}.",
                    soft, size.ss, size.xs, code
                )));
            }
            let soft = &soft[..size.ss - size.xs];
            if !is_base64(soft) {
                return Err(MatterError::InvalidSoft(format!(
                    "Non Base64 chars in soft={}.",
                    soft
                )));
            }
            soft.to_string()
        } else {
            String::new()
        };

        let raw_val = if rize > 0 {
            let raw = raw.ok_or_else(|| {
                MatterError::EmptyMaterial(format!("Missing raw for code={}.", code))
            })?;
            if raw.len() < rize {
                return Err(MatterError::RawMaterial(format!(
                    "Not enough raw bytes for code={} expected {} got {}.",
                    code,
                    rize,
                    raw.len()
                )));
            }
            raw[..rize].to_vec()
        } else {
            Vec::new()
        };

        Ok(BaseMatter {
            code: code.to_string(),
            soft: soft_val,
            raw: raw_val,
        })
    }

    /// Create a special soft value primitive with empty raw, such as a tag.
    pub fn from_soft_and_code(soft: &str, code: &str) -> Result<Self, MatterError> {
        let size = *SIZES
            .get(code)
            .ok_or_else(|| MatterError::UnsupportedCode(format!("Unsupported code={}", code)))?;

        let fs = size.fs.ok_or_else(|| {
            MatterError::InvalidSoft(format!(
                "Unsupported variable sized code={} for special soft={}.",
                code, soft
            ))
        })?;

        if size.ss == 0 || (fs != size.hs + size.ss) || size.ls != 0 {
            return Err(MatterError::InvalidSoft(format!(
                "Invalid ss={} or ls={} or fs={} for code={} when special soft.",
                size.ss, size.ls, fs, code
            )));
        }

        if soft.len() < size.ss - size.xs {
            return Err(MatterError::SoftMaterial(format!(
                "Not enough chars in soft={} with ss={} xs={} for code={}.",
                soft, size.ss, size.xs, code
            )));
        }
        let soft = &soft[..size.ss - size.xs];
        if !is_base64(soft) {
            return Err(MatterError::InvalidSoft(format!(
                "Non Base64 chars in soft={}.",
                soft
            )));
        }

        Ok(BaseMatter {
            code: code.to_string(),
            soft: soft.to_string(),
            raw: Vec::new(),
        })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        let (matter, _) = Self::exfil(qb64.as_bytes())?;
        Ok(matter)
    }

    /// Extract one primitive from the front of `qb64b`, returning it and
    /// the count of chars consumed.
    fn exfil(qb64b: &[u8]) -> Result<(Self, usize), MatterError> {
        if qb64b.is_empty() {
            return Err(MatterError::Shortage(
                "Empty material, need more characters.".to_string(),
            ));
        }

        let first = qb64b[0];
        let hards = hards();
        let hs = match hards.get(&first) {
            Some(hs) => *hs,
            None => {
                return if first == b'-' {
                    Err(MatterError::UnexpectedCountCode(
                        "Unexpected count code start while extracting Matter.".to_string(),
                    ))
                } else if first == b'_' {
                    Err(MatterError::UnexpectedOpCode(
                        "Unexpected op code start while extracting Matter.".to_string(),
                    ))
                } else {
                    Err(MatterError::UnexpectedCode(format!(
                        "Unsupported code start char={}.",
                        first as char
                    )))
                }
            }
        };

        if qb64b.len() < hs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                hs - qb64b.len()
            )));
        }

        let hard = str::from_utf8(&qb64b[..hs])
            .map_err(|_| MatterError::Conversion("Invalid UTF-8 in code.".to_string()))?;
        let size = *SIZES
            .get(hard)
            .ok_or_else(|| MatterError::UnexpectedCode(format!("Unsupported code={}.", hard)))?;

        let cs = size.hs + size.ss;
        if qb64b.len() < cs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                cs - qb64b.len()
            )));
        }

        let soft_with_xtra = str::from_utf8(&qb64b[size.hs..cs])
            .map_err(|_| MatterError::Conversion("Invalid UTF-8 in soft.".to_string()))?;
        let xtra = &soft_with_xtra[..size.xs];
        let soft = &soft_with_xtra[size.xs..];

        if xtra != "A".repeat(size.xs) {
            return Err(MatterError::UnexpectedCode(format!(
                "Invalid prepad xtra={}.",
                xtra
            )));
        }

        let fs = match size.fs {
            Some(fs) => fs,
            None => (b64_to_int(soft)? as usize * 4) + cs,
        };

        if qb64b.len() < fs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                fs - qb64b.len()
            )));
        }

        // Prepad with ps 'A' chars so decode is 24 bit aligned
        let ps = cs % 4;
        let mut base = vec![b'A'; ps];
        base.extend_from_slice(&qb64b[cs..fs]);
        let paw = decode_b64(&base)?;

        // Midpad bytes from prepad and lead must be zero
        let midpad = &paw[..ps + size.ls];
        if midpad.iter().any(|b| *b != 0) {
            return Err(MatterError::Conversion(format!(
                "Nonzero midpad bytes={:02x?}.",
                midpad
            )));
        }

        let raw = paw[ps + size.ls..].to_vec();
        let expected = ((fs - cs) * 3) / 4 - size.ls;
        if raw.len() != expected {
            return Err(MatterError::Conversion(
                "Improperly qualified material.".to_string(),
            ));
        }

        Ok((
            BaseMatter {
                code: hard.to_string(),
                soft: soft.to_string(),
                raw,
            },
            fs,
        ))
    }

    /// Extract one primitive from the front of a binary qb2 stream,
    /// returning it and the count of bytes consumed.
    fn bexfil(qb2: &[u8]) -> Result<(Self, usize), MatterError> {
        if qb2.is_empty() {
            return Err(MatterError::Shortage(
                "Empty material, need more bytes.".to_string(),
            ));
        }

        let first = nab_sextets(qb2, 1)?;
        let first_char = *B64_CHR_BY_IDX
            .get(&first[0])
            .ok_or_else(|| MatterError::Conversion("Invalid sextet.".to_string()))? as u8;

        let hards = hards();
        let hs = match hards.get(&first_char) {
            Some(hs) => *hs,
            None => {
                return if first_char == b'-' {
                    Err(MatterError::UnexpectedCountCode(
                        "Unexpected count code start while extracting Matter.".to_string(),
                    ))
                } else if first_char == b'_' {
                    Err(MatterError::UnexpectedOpCode(
                        "Unexpected op code start while extracting Matter.".to_string(),
                    ))
                } else {
                    Err(MatterError::UnexpectedCode(format!(
                        "Unsupported code start sextet={:02x?}.",
                        first
                    )))
                }
            }
        };

        let bhs = (hs * 3 + 3) / 4;
        if qb2.len() < bhs {
            return Err(MatterError::Shortage(format!(
                "Need {} more bytes.",
                bhs - qb2.len()
            )));
        }

        let hard = code_b2_to_b64(qb2, hs)?;
        let size = *SIZES
            .get(hard.as_str())
            .ok_or_else(|| MatterError::UnexpectedCode(format!("Unsupported code={}.", hard)))?;

        let cs = size.hs + size.ss;
        let bcs = (cs * 3 + 3) / 4;
        if qb2.len() < bcs {
            return Err(MatterError::Shortage(format!(
                "Need {} more bytes.",
                bcs - qb2.len()
            )));
        }

        let both = code_b2_to_b64(qb2, cs)?;
        let soft_with_xtra = &both[size.hs..];
        let xtra = &soft_with_xtra[..size.xs];
        let soft = soft_with_xtra[size.xs..].to_string();

        if xtra != "A".repeat(size.xs) {
            return Err(MatterError::UnexpectedCode(format!(
                "Invalid prepad xtra={}.",
                xtra
            )));
        }

        let fs = match size.fs {
            Some(fs) => fs,
            None => (b64_to_int(&soft)? as usize * 4) + cs,
        };

        let bfs = (fs * 3 + 3) / 4;
        if qb2.len() < bfs {
            return Err(MatterError::Shortage(format!(
                "Need {} more bytes.",
                bfs - qb2.len()
            )));
        }

        // Code mid pad bits must be zero
        let ps = cs % 4;
        let pbs = 2 * ps;
        if pbs > 0 {
            let pi = qb2[bcs - 1];
            let mask = (1u8 << pbs) - 1;
            if pi & mask != 0 {
                return Err(MatterError::Conversion(format!(
                    "Nonzero code mid pad bits=0b{:0width$b}.",
                    pi & mask,
                    width = pbs
                )));
            }
        }

        // Lead midpad bytes must be zero
        if size.ls > 0 && qb2[bcs..bcs + size.ls].iter().any(|b| *b != 0) {
            return Err(MatterError::Conversion(
                "Nonzero lead midpad bytes.".to_string(),
            ));
        }

        let raw = qb2[bcs + size.ls..bfs].to_vec();

        Ok((
            BaseMatter {
                code: hard,
                soft,
                raw,
            },
            bfs,
        ))
    }

    /// Compose the qb64 text domain representation
    fn infil(&self) -> Result<String, MatterError> {
        let size = *SIZES.get(self.code.as_str()).ok_or_else(|| {
            MatterError::UnsupportedCode(format!("Unsupported code={}", self.code))
        })?;

        let both = format!("{}{}{}", self.code, "A".repeat(size.xs), self.soft);
        let rs = self.raw.len();
        let cs = size.hs + size.ss;

        if cs != both.len() {
            return Err(MatterError::InvalidCodeSize(format!(
                "Invalid full code={} for sizes hs={} and ss={}.",
                both, size.hs, size.ss
            )));
        }

        let full = if size.fs.is_none() {
            // Variable sized: both full code and lead+raw must be aligned
            if (size.ls + rs) % 3 != 0 || cs % 4 != 0 {
                return Err(MatterError::InvalidCodeSize(format!(
                    "Invalid full code={} with variable raw size={}.",
                    both, rs
                )));
            }
            let mut padded = vec![0u8; size.ls];
            padded.extend_from_slice(&self.raw);
            format!("{}{}", both, encode_b64(&padded))
        } else {
            let ps = (3 - ((rs + size.ls) % 3)) % 3;
            if ps != cs % 4 {
                return Err(MatterError::InvalidCodeSize(format!(
                    "Invalid full code={} with fixed raw size={}.",
                    both, rs
                )));
            }
            let mut padded = vec![0u8; ps + size.ls];
            padded.extend_from_slice(&self.raw);
            let encoded = encode_b64(&padded);
            format!("{}{}", both, &encoded[ps..])
        };

        if full.len() % 4 != 0 || size.fs.map(|fs| full.len() != fs).unwrap_or(false) {
            return Err(MatterError::InvalidCodeSize(format!(
                "Invalid full size for code={} with raw size={}.",
                both, rs
            )));
        }

        Ok(full)
    }

    /// Compose the qb2 binary domain representation
    fn binfil(&self) -> Result<Vec<u8>, MatterError> {
        let size = *SIZES.get(self.code.as_str()).ok_or_else(|| {
            MatterError::UnsupportedCode(format!("Unsupported code={}", self.code))
        })?;

        let both = format!("{}{}{}", self.code, "A".repeat(size.xs), self.soft);
        let cs = size.hs + size.ss;
        let n = (cs * 3 + 3) / 4;

        let shifted = b64_to_int(&both)? << (2 * (cs % 4));
        let bytes = shifted.to_be_bytes();
        let bcode = bytes[bytes.len() - n..].to_vec();

        let mut full = bcode;
        full.extend_from_slice(&vec![0u8; size.ls]);
        full.extend_from_slice(&self.raw);

        Ok(full)
    }
}

impl Parsable for BaseMatter {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let (matter, fs) = Self::exfil(data)?;
        if strip.unwrap_or(false) {
            data.drain(..fs);
        }
        Ok(matter)
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let (matter, bfs) = Self::bexfil(data)?;
        if strip.unwrap_or(false) {
            data.drain(..bfs);
        }
        Ok(matter)
    }
}

impl Matter for BaseMatter {
    fn code(&self) -> &str {
        &self.code
    }

    fn soft(&self) -> &str {
        &self.soft
    }

    fn raw(&self) -> &[u8] {
        &self.raw
    }

    fn qb64(&self) -> String {
        self.infil().expect("composable material")
    }

    fn qb64b(&self) -> Vec<u8> {
        self.qb64().into_bytes()
    }

    fn qb2(&self) -> Vec<u8> {
        self.binfil().expect("composable material")
    }

    fn full_size(&self) -> usize {
        let size = SIZES[self.code.as_str()];
        match size.fs {
            Some(fs) => fs,
            None => size.hs + size.ss + ((self.raw.len() + size.ls) * 4) / 3,
        }
    }

    fn name(&self) -> &'static str {
        NAMES.get(self.code.as_str()).copied().unwrap_or("Unknown")
    }

    fn is_transferable(&self) -> bool {
        !non_trans_dex::TUPLE.contains(&self.code.as_str())
    }

    fn is_digestive(&self) -> bool {
        dig_dex::TUPLE.contains(&self.code.as_str())
    }

    fn is_prefixive(&self) -> bool {
        pre_dex::TUPLE.contains(&self.code.as_str())
    }
}

/// Raw size in bytes for a fixed sized derivation code
pub fn raw_size(code: &str) -> Result<usize, MatterError> {
    let size = SIZES
        .get(code)
        .ok_or_else(|| MatterError::UnsupportedCode(format!("Unsupported code={}", code)))?;
    let cs = size.hs + size.ss;
    let fs = size
        .fs
        .ok_or_else(|| MatterError::InvalidVarRawSize(format!("Variable sized code={}", code)))?;

    Ok(((fs - cs) * 3) / 4 - size.ls)
}

pub(crate) fn decode_b64(data: &[u8]) -> Result<Vec<u8>, MatterError> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|_| MatterError::Conversion("Invalid Base64.".to_string()))
}

pub(crate) fn encode_b64(data: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(data)
}

/// Convert Base64 URL-safe chars to an unsigned integer
pub(crate) fn b64_to_int(b64: &str) -> Result<u64, MatterError> {
    let mut result = 0u64;
    for c in b64.chars() {
        let val = match c {
            'A'..='Z' => c as u64 - 'A' as u64,
            'a'..='z' => c as u64 - 'a' as u64 + 26,
            '0'..='9' => c as u64 - '0' as u64 + 52,
            '-' => 62,
            '_' => 63,
            _ => {
                return Err(MatterError::Conversion(format!(
                    "Invalid Base64 char={}.",
                    c
                )))
            }
        };
        result = result * 64 + val;
    }
    Ok(result)
}

/// Convert an unsigned integer to Base64 URL-safe chars, left padded with
/// 'A' to length l
pub(crate) fn int_to_b64(i: u64, l: usize) -> String {
    let mut result = Vec::new();
    let mut value = i;

    loop {
        let idx = (value % 64) as u8;
        result.push(B64_CHR_BY_IDX[&idx]);
        value /= 64;
        if value == 0 {
            break;
        }
    }

    while result.len() < l {
        result.push('A');
    }

    result.reverse();
    result.into_iter().collect()
}

/// Extract n sextets from the front of binary data
pub(crate) fn nab_sextets(qb2: &[u8], n: usize) -> Result<Vec<u8>, MatterError> {
    let mut result = Vec::with_capacity(n);
    let mut accumulator: u16 = 0;
    let mut bits = 0;
    let mut i = 0;

    while result.len() < n && i < qb2.len() {
        accumulator = (accumulator << 8) | (qb2[i] as u16);
        bits += 8;
        i += 1;

        while bits >= 6 && result.len() < n {
            bits -= 6;
            result.push(((accumulator >> bits) & 0x3F) as u8);
        }
    }

    if result.len() < n {
        return Err(MatterError::Shortage(format!(
            "Not enough bytes to extract {} sextets.",
            n
        )));
    }

    Ok(result)
}

/// Convert the first n sextets of binary data to a Base64 string
pub(crate) fn code_b2_to_b64(qb2: &[u8], n: usize) -> Result<String, MatterError> {
    let sextets = nab_sextets(qb2, n)?;
    let mut result = String::with_capacity(n);

    for sextet in sextets {
        match B64_CHR_BY_IDX.get(&sextet) {
            Some(c) => result.push(*c),
            None => {
                return Err(MatterError::Conversion(format!(
                    "Invalid Base64 index={}.",
                    sextet
                )))
            }
        }
    }

    Ok(result)
}

fn is_base64(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
