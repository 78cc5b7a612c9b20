use crate::cesr::verfer::Verfer;
use crate::cesr::{b64_to_int, decode_b64, encode_b64, int_to_b64};
use crate::errors::MatterError;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Derivation codes for indexed signatures
#[allow(dead_code)]
pub mod idr_dex {
    pub const ED25519_SIG: &str = "A"; // Ed25519 sig, index == ondex, small
    pub const ED25519_CRT_SIG: &str = "B"; // Ed25519 sig, current keys only, small
    pub const ECDSA_256K1_SIG: &str = "C"; // ECDSA secp256k1 sig, small
    pub const ECDSA_256K1_CRT_SIG: &str = "D"; // ECDSA secp256k1 sig, current only, small
    pub const ECDSA_256R1_SIG: &str = "E"; // ECDSA secp256r1 sig, small
    pub const ECDSA_256R1_CRT_SIG: &str = "F"; // ECDSA secp256r1 sig, current only, small
    pub const ED25519_BIG_SIG: &str = "2A"; // Ed25519 sig, big indices
    pub const ED25519_BIG_CRT_SIG: &str = "2B"; // Ed25519 sig, current only, big index
    pub const ECDSA_256K1_BIG_SIG: &str = "2C"; // ECDSA secp256k1 sig, big indices
    pub const ECDSA_256K1_BIG_CRT_SIG: &str = "2D"; // ECDSA secp256k1 sig, current only, big
    pub const ECDSA_256R1_BIG_SIG: &str = "2E"; // ECDSA secp256r1 sig, big indices
    pub const ECDSA_256R1_BIG_CRT_SIG: &str = "2F"; // ECDSA secp256r1 sig, current only, big
}

/// Size information for an indexed signature code
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Xizage {
    pub hs: usize, // hard size in chars
    pub ss: usize, // soft size in chars, indices
    pub os: usize, // other index size in chars within soft
    pub fs: usize, // full size in chars
}

fn xz(hs: usize, ss: usize, os: usize, fs: usize) -> Xizage {
    Xizage { hs, ss, os, fs }
}

pub static XIZES: Lazy<HashMap<&'static str, Xizage>> = Lazy::new(|| {
    let mut sizes = HashMap::new();
    sizes.insert("A", xz(1, 1, 0, 88));
    sizes.insert("B", xz(1, 1, 0, 88));
    sizes.insert("C", xz(1, 1, 0, 88));
    sizes.insert("D", xz(1, 1, 0, 88));
    sizes.insert("E", xz(1, 1, 0, 88));
    sizes.insert("F", xz(1, 1, 0, 88));
    sizes.insert("2A", xz(2, 4, 2, 92));
    sizes.insert("2B", xz(2, 4, 0, 92));
    sizes.insert("2C", xz(2, 4, 2, 92));
    sizes.insert("2D", xz(2, 4, 0, 92));
    sizes.insert("2E", xz(2, 4, 2, 92));
    sizes.insert("2F", xz(2, 4, 0, 92));
    sizes
});

/// Siger is an indexed signature. The soft part carries the offset of the
/// signing key within the current key list and, for dual indexed codes,
/// the offset within the prior next key list.
#[derive(Debug, Clone)]
pub struct Siger {
    code: String,
    raw: Vec<u8>,
    index: u32,
    ondex: Option<u32>,
    pub verfer: Option<Verfer>,
}

impl Siger {
    pub fn new(
        raw: Option<&[u8]>,
        code: Option<&str>,
        index: Option<u32>,
        ondex: Option<u32>,
        verfer: Option<Verfer>,
    ) -> Result<Self, MatterError> {
        let code = code.unwrap_or(idr_dex::ED25519_SIG);
        let size = *XIZES
            .get(code)
            .ok_or_else(|| MatterError::UnsupportedCode(String::from(code)))?;
        let index = index.unwrap_or(0);

        let inds = size.ss - size.os;
        if u64::from(index) > 64u64.pow(inds as u32) - 1 {
            return Err(MatterError::InvalidVarIndex(format!(
                "Invalid index={} for code={}.",
                index, code
            )));
        }

        let ondex = if size.os > 0 {
            let ondex = ondex.unwrap_or(index);
            if u64::from(ondex) > 64u64.pow(size.os as u32) - 1 {
                return Err(MatterError::InvalidVarIndex(format!(
                    "Invalid ondex={} for code={}.",
                    ondex, code
                )));
            }
            Some(ondex)
        } else {
            // Single index codes carry the ondex implicitly or not at all
            match code {
                idr_dex::ED25519_SIG | idr_dex::ECDSA_256K1_SIG | idr_dex::ECDSA_256R1_SIG => {
                    Some(index)
                }
                _ => None,
            }
        };

        let raw = raw.ok_or_else(|| {
            MatterError::EmptyMaterial("Missing raw for indexed signature.".to_string())
        })?;

        let rize = ((size.fs - (size.hs + size.ss)) * 3) / 4;
        if raw.len() < rize {
            return Err(MatterError::RawMaterial(format!(
                "Not enough raw bytes for code={} expected {} got {}.",
                code,
                rize,
                raw.len()
            )));
        }

        Ok(Siger {
            code: code.to_string(),
            raw: raw[..rize].to_vec(),
            index,
            ondex,
            verfer,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn ondex(&self) -> Option<u32> {
        self.ondex
    }

    pub fn qb64(&self) -> String {
        let size = XIZES[self.code.as_str()];
        let inds = size.ss - size.os;

        let mut soft = int_to_b64(self.index as u64, inds);
        if size.os > 0 {
            soft.push_str(&int_to_b64(self.ondex.unwrap_or(0) as u64, size.os));
        }

        let cs = size.hs + size.ss;
        let ps = (3 - (self.raw.len() % 3)) % 3;
        debug_assert_eq!(ps, cs % 4);

        let mut padded = vec![0u8; ps];
        padded.extend_from_slice(&self.raw);
        let encoded = encode_b64(&padded);

        format!("{}{}{}", self.code, soft, &encoded[ps..])
    }

    pub fn qb64b(&self) -> Vec<u8> {
        self.qb64().into_bytes()
    }

    /// Extract one indexed signature from the front of a qb64 stream.
    pub fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        if data.is_empty() {
            return Err(MatterError::Shortage(
                "Empty material, need more characters.".to_string(),
            ));
        }

        let first = data[0] as char;
        let hs = match first {
            'A'..='Z' | 'a'..='z' => 1,
            '0'..='9' => 2,
            _ => {
                return Err(MatterError::UnexpectedCode(format!(
                    "Unsupported indexed code start char={}.",
                    first
                )))
            }
        };

        if data.len() < hs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                hs - data.len()
            )));
        }

        let hard = std::str::from_utf8(&data[..hs])
            .map_err(|_| MatterError::Conversion("Invalid UTF-8 in code.".to_string()))?
            .to_string();
        let size = *XIZES
            .get(hard.as_str())
            .ok_or_else(|| MatterError::UnexpectedCode(format!("Unsupported code={}.", hard)))?;

        if data.len() < size.fs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                size.fs - data.len()
            )));
        }

        let cs = size.hs + size.ss;
        let inds = size.ss - size.os;
        let soft = std::str::from_utf8(&data[size.hs..cs])
            .map_err(|_| MatterError::Conversion("Invalid UTF-8 in soft.".to_string()))?;

        let index = b64_to_int(&soft[..inds])? as u32;
        let ondex = if size.os > 0 {
            Some(b64_to_int(&soft[inds..])? as u32)
        } else {
            None
        };

        let ps = cs % 4;
        let mut base = vec![b'A'; ps];
        base.extend_from_slice(&data[cs..size.fs]);
        let paw = decode_b64(&base)?;
        let raw = paw[ps..].to_vec();

        if strip.unwrap_or(false) {
            data.drain(..size.fs);
        }

        Ok(Siger {
            code: hard,
            raw,
            index,
            ondex,
            verfer: None,
        })
    }
}
