use crate::cesr::{code_b2_to_b64, decode_b64, int_to_b64};
use crate::errors::MatterError;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::str;

/// Counter codes for framing groups, CESR 2.0 table
#[allow(dead_code)]
pub mod ctr_dex {
    pub const GENERIC_GROUP: &str = "-A"; // Generic group (universal)
    pub const BIG_GENERIC_GROUP: &str = "-0A"; // Big generic group
    pub const MESSAGE_GROUP: &str = "-B"; // Message body plus attachments group
    pub const BIG_MESSAGE_GROUP: &str = "-0B"; // Big message body plus attachments group
    pub const ATTACHMENT_GROUP: &str = "-C"; // Message attachments only group
    pub const BIG_ATTACHMENT_GROUP: &str = "-0C"; // Big attachments only group
    pub const FIXED_MESSAGE_BODY_GROUP: &str = "-F"; // Fixed field message body group
    pub const BIG_FIXED_MESSAGE_BODY_GROUP: &str = "-0F"; // Big fixed field message body group
    pub const MAP_MESSAGE_BODY_GROUP: &str = "-G"; // Field map message body group
    pub const BIG_MAP_MESSAGE_BODY_GROUP: &str = "-0G"; // Big field map message body group
    pub const GENERIC_LIST_GROUP: &str = "-I"; // Generic list group
    pub const BIG_GENERIC_LIST_GROUP: &str = "-0I"; // Big generic list group
    pub const CONTROLLER_IDX_SIGS: &str = "-J"; // Controller indexed signatures
    pub const BIG_CONTROLLER_IDX_SIGS: &str = "-0J"; // Big controller indexed signatures
    pub const SEAL_SOURCE_COUPLES: &str = "-Q"; // Seal source couples, snu+dig
    pub const BIG_SEAL_SOURCE_COUPLES: &str = "-0Q"; // Big seal source couples
    pub const SEAL_SOURCE_TRIPLES: &str = "-R"; // Seal source triples, pre+snu+dig
    pub const BIG_SEAL_SOURCE_TRIPLES: &str = "-0R"; // Big seal source triples
    pub const DIGEST_SEAL_SINGLES: &str = "-V"; // Digest seal singles, dig
    pub const BIG_DIGEST_SEAL_SINGLES: &str = "-0V"; // Big digest seal singles
    pub const MERKLE_ROOT_SEAL_SINGLES: &str = "-W"; // Merkle tree root digest seal singles
    pub const BIG_MERKLE_ROOT_SEAL_SINGLES: &str = "-0W"; // Big merkle root seal singles
    pub const BACKER_REGISTRAR_SEAL_COUPLES: &str = "-X"; // Backer registrar seal couples, brid+dig
    pub const BIG_BACKER_REGISTRAR_SEAL_COUPLES: &str = "-0X"; // Big backer registrar seal couples
    pub const SEAL_SOURCE_LAST_SINGLES: &str = "-Y"; // Seal source last singles, pre
    pub const BIG_SEAL_SOURCE_LAST_SINGLES: &str = "-0Y"; // Big seal source last singles
    pub const KERI_ACDC_GENUS_VERSION: &str = "--AAA"; // Protocol genus version
}

/// Counter code names for annotation
pub static NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(ctr_dex::GENERIC_GROUP, "GenericGroup");
    map.insert(ctr_dex::BIG_GENERIC_GROUP, "BigGenericGroup");
    map.insert(ctr_dex::MESSAGE_GROUP, "MessageGroup");
    map.insert(ctr_dex::BIG_MESSAGE_GROUP, "BigMessageGroup");
    map.insert(ctr_dex::ATTACHMENT_GROUP, "AttachmentGroup");
    map.insert(ctr_dex::BIG_ATTACHMENT_GROUP, "BigAttachmentGroup");
    map.insert(ctr_dex::FIXED_MESSAGE_BODY_GROUP, "FixBodyGroup");
    map.insert(ctr_dex::BIG_FIXED_MESSAGE_BODY_GROUP, "BigFixBodyGroup");
    map.insert(ctr_dex::MAP_MESSAGE_BODY_GROUP, "MapBodyGroup");
    map.insert(ctr_dex::BIG_MAP_MESSAGE_BODY_GROUP, "BigMapBodyGroup");
    map.insert(ctr_dex::GENERIC_LIST_GROUP, "GenericListGroup");
    map.insert(ctr_dex::BIG_GENERIC_LIST_GROUP, "BigGenericListGroup");
    map.insert(ctr_dex::CONTROLLER_IDX_SIGS, "ControllerIdxSigs");
    map.insert(ctr_dex::BIG_CONTROLLER_IDX_SIGS, "BigControllerIdxSigs");
    map.insert(ctr_dex::SEAL_SOURCE_COUPLES, "SealSourceCouples");
    map.insert(ctr_dex::BIG_SEAL_SOURCE_COUPLES, "BigSealSourceCouples");
    map.insert(ctr_dex::SEAL_SOURCE_TRIPLES, "SealSourceTriples");
    map.insert(ctr_dex::BIG_SEAL_SOURCE_TRIPLES, "BigSealSourceTriples");
    map.insert(ctr_dex::DIGEST_SEAL_SINGLES, "DigestSealSingles");
    map.insert(ctr_dex::BIG_DIGEST_SEAL_SINGLES, "BigDigestSealSingles");
    map.insert(ctr_dex::MERKLE_ROOT_SEAL_SINGLES, "MerkleRootSealSingles");
    map.insert(
        ctr_dex::BIG_MERKLE_ROOT_SEAL_SINGLES,
        "BigMerkleRootSealSingles",
    );
    map.insert(
        ctr_dex::BACKER_REGISTRAR_SEAL_COUPLES,
        "BackerRegistrarSealCouples",
    );
    map.insert(
        ctr_dex::BIG_BACKER_REGISTRAR_SEAL_COUPLES,
        "BigBackerRegistrarSealCouples",
    );
    map.insert(ctr_dex::SEAL_SOURCE_LAST_SINGLES, "SealSourceLastSingles");
    map.insert(
        ctr_dex::BIG_SEAL_SOURCE_LAST_SINGLES,
        "BigSealSourceLastSingles",
    );
    map.insert(ctr_dex::KERI_ACDC_GENUS_VERSION, "KeriAcdcGenusVersion");
    map
});

/// Size information for a counter code
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cizage {
    pub hs: usize, // hard size in chars
    pub ss: usize, // soft size in chars, the count
    pub fs: usize, // full size in chars
}

pub static CIZES: Lazy<HashMap<&'static str, Cizage>> = Lazy::new(|| {
    let small = Cizage {
        hs: 2,
        ss: 2,
        fs: 4,
    };
    let big = Cizage {
        hs: 3,
        ss: 5,
        fs: 8,
    };

    let mut sizes = HashMap::new();
    for code in [
        ctr_dex::GENERIC_GROUP,
        ctr_dex::MESSAGE_GROUP,
        ctr_dex::ATTACHMENT_GROUP,
        ctr_dex::FIXED_MESSAGE_BODY_GROUP,
        ctr_dex::MAP_MESSAGE_BODY_GROUP,
        ctr_dex::GENERIC_LIST_GROUP,
        ctr_dex::CONTROLLER_IDX_SIGS,
        ctr_dex::SEAL_SOURCE_COUPLES,
        ctr_dex::SEAL_SOURCE_TRIPLES,
        ctr_dex::DIGEST_SEAL_SINGLES,
        ctr_dex::MERKLE_ROOT_SEAL_SINGLES,
        ctr_dex::BACKER_REGISTRAR_SEAL_COUPLES,
        ctr_dex::SEAL_SOURCE_LAST_SINGLES,
    ] {
        sizes.insert(code, small);
    }

    for code in [
        ctr_dex::BIG_GENERIC_GROUP,
        ctr_dex::BIG_MESSAGE_GROUP,
        ctr_dex::BIG_ATTACHMENT_GROUP,
        ctr_dex::BIG_FIXED_MESSAGE_BODY_GROUP,
        ctr_dex::BIG_MAP_MESSAGE_BODY_GROUP,
        ctr_dex::BIG_GENERIC_LIST_GROUP,
        ctr_dex::BIG_CONTROLLER_IDX_SIGS,
        ctr_dex::BIG_SEAL_SOURCE_COUPLES,
        ctr_dex::BIG_SEAL_SOURCE_TRIPLES,
        ctr_dex::BIG_DIGEST_SEAL_SINGLES,
        ctr_dex::BIG_MERKLE_ROOT_SEAL_SINGLES,
        ctr_dex::BIG_BACKER_REGISTRAR_SEAL_COUPLES,
        ctr_dex::BIG_SEAL_SOURCE_LAST_SINGLES,
    ] {
        sizes.insert(code, big);
    }

    sizes.insert(
        ctr_dex::KERI_ACDC_GENUS_VERSION,
        Cizage {
            hs: 5,
            ss: 3,
            fs: 8,
        },
    );

    sizes
});

/// Counter is a framing primitive. Its count gives the length of the
/// group it introduces in quadlets (4 char / 3 byte units).
#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    code: String,
    count: u64,
}

impl Counter {
    pub fn new(code: &str, count: u64) -> Result<Self, MatterError> {
        let size = *CIZES
            .get(code)
            .ok_or_else(|| MatterError::UnsupportedCode(format!("Unsupported code={}", code)))?;

        // Promote a small code to its big variant when the count overflows
        let (code, size) = if count > 64u64.pow(size.ss as u32) - 1 && size.hs == 2 {
            let big = format!("-0{}", &code[1..2]);
            let size = *CIZES.get(big.as_str()).ok_or_else(|| {
                MatterError::InvalidVarIndex(format!(
                    "Invalid count={} for code={} with no big variant.",
                    count, code
                ))
            })?;
            (big, size)
        } else {
            (code.to_string(), size)
        };

        if count > 64u64.pow(size.ss as u32) - 1 {
            return Err(MatterError::InvalidVarIndex(format!(
                "Invalid count={} for code={}.",
                count, code
            )));
        }

        Ok(Counter { code, count })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Count of quadlets in the group this counter introduces
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn name(&self) -> &'static str {
        NAMES.get(self.code.as_str()).copied().unwrap_or("Unknown")
    }

    pub fn full_size(&self) -> usize {
        CIZES[self.code.as_str()].fs
    }

    pub fn qb64(&self) -> String {
        let size = CIZES[self.code.as_str()];
        format!("{}{}", self.code, int_to_b64(self.count, size.ss))
    }

    pub fn qb64b(&self) -> Vec<u8> {
        self.qb64().into_bytes()
    }

    pub fn qb2(&self) -> Vec<u8> {
        // Counter full codes are 24 bit aligned so the binary domain is a
        // straight Base64 decode
        decode_b64(self.qb64().as_bytes()).expect("composable counter")
    }

    /// Extract one counter from the front of a qb64 stream.
    pub fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        if data.len() < 2 {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                2 - data.len()
            )));
        }

        if data[0] != b'-' {
            return Err(MatterError::UnexpectedCode(format!(
                "Unsupported counter start char={}.",
                data[0] as char
            )));
        }

        let hs = match data[1] {
            b'A'..=b'Z' | b'a'..=b'z' => 2,
            b'0' => 3,
            b'-' => 5,
            _ => {
                return Err(MatterError::UnexpectedCode(format!(
                    "Unsupported counter selector char={}.",
                    data[1] as char
                )))
            }
        };

        if data.len() < hs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                hs - data.len()
            )));
        }

        let hard = str::from_utf8(&data[..hs])
            .map_err(|_| MatterError::Conversion("Invalid UTF-8 in counter code.".to_string()))?
            .to_string();
        let size = *CIZES
            .get(hard.as_str())
            .ok_or_else(|| MatterError::UnexpectedCode(format!("Unsupported code={}.", hard)))?;

        if data.len() < size.fs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                size.fs - data.len()
            )));
        }

        let soft = str::from_utf8(&data[hs..size.fs])
            .map_err(|_| MatterError::Conversion("Invalid UTF-8 in counter count.".to_string()))?;
        let count = b64_to_biguint(soft)?
            .to_u64()
            .ok_or_else(|| MatterError::Value("Count value too large.".to_string()))?;

        if strip.unwrap_or(false) {
            data.drain(..size.fs);
        }

        Ok(Counter { code: hard, count })
    }

    /// Extract one counter from the front of a binary qb2 stream.
    pub fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        if data.is_empty() {
            return Err(MatterError::Shortage(
                "Empty material, need more bytes.".to_string(),
            ));
        }

        // Peek enough sextets to recover the text domain code selector
        let two = code_b2_to_b64(data, 2)?;
        let hs = match two.as_bytes()[1] {
            b'A'..=b'Z' | b'a'..=b'z' => 2,
            b'0' => 3,
            b'-' => 5,
            _ => {
                return Err(MatterError::UnexpectedCode(format!(
                    "Unsupported counter selector={}.",
                    &two[1..2]
                )))
            }
        };

        let hard = code_b2_to_b64(data, hs)?;
        let size = *CIZES
            .get(hard.as_str())
            .ok_or_else(|| MatterError::UnexpectedCode(format!("Unsupported code={}.", hard)))?;

        let bfs = (size.fs * 3) / 4;
        if data.len() < bfs {
            return Err(MatterError::Shortage(format!(
                "Need {} more bytes.",
                bfs - data.len()
            )));
        }

        let both = code_b2_to_b64(data, size.fs)?;
        let count = b64_to_biguint(&both[hs..])?
            .to_u64()
            .ok_or_else(|| MatterError::Value("Count value too large.".to_string()))?;

        if strip.unwrap_or(false) {
            data.drain(..bfs);
        }

        Ok(Counter { code: hard, count })
    }
}

/// Convert Base64 chars to an unsigned big integer
fn b64_to_biguint(s: &str) -> Result<BigUint, MatterError> {
    let mut result = BigUint::from(0u32);

    for c in s.chars() {
        result <<= 6;
        let val: u32 = match c {
            'A'..='Z' => c as u32 - 'A' as u32,
            'a'..='z' => c as u32 - 'a' as u32 + 26,
            '0'..='9' => c as u32 - '0' as u32 + 52,
            '-' => 62,
            '_' => 63,
            _ => {
                return Err(MatterError::Conversion(format!(
                    "Invalid Base64 char={}.",
                    c
                )))
            }
        };
        result += BigUint::from(val);
    }

    Ok(result)
}
