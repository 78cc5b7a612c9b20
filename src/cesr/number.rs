use crate::cesr::{num_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;

/// Number is a Matter subclass holding an ordinal counting number such as
/// a sequence number. Construction picks the smallest code whose raw width
/// holds the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    base: BaseMatter,
}

impl Number {
    pub fn new(num: u64) -> Result<Self, MatterError> {
        let (code, width) = if num <= u16::MAX as u64 {
            (num_dex::SHORT, 2)
        } else if num <= u32::MAX as u64 {
            (num_dex::LONG, 4)
        } else {
            (num_dex::BIG, 8)
        };

        let bytes = num.to_be_bytes();
        let raw = &bytes[8 - width..];
        let base = BaseMatter::new(Some(raw), Some(code), None, None)?;
        Ok(Number { base })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64(qb64)?;
        if !num_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Number { base })
    }

    /// Ordinal value of the number
    pub fn sn(&self) -> u64 {
        let raw = self.base.raw();
        let mut bytes = [0u8; 8];
        bytes[8 - raw.len()..].copy_from_slice(raw);
        u64::from_be_bytes(bytes)
    }

    /// Hex string rendering of the ordinal
    pub fn snh(&self) -> String {
        format!("{:x}", self.sn())
    }
}

impl Parsable for Number {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if !num_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Number { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if !num_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Number { base })
    }
}

impl Matter for Number {
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
