use crate::cesr::{mtr_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;

/// Codex of known message ilks (types)
pub mod ilk_dex {
    pub const ICP: &str = "icp"; // inception
    pub const ROT: &str = "rot"; // rotation
    pub const IXN: &str = "ixn"; // interaction
    pub const DIP: &str = "dip"; // delegated inception
    pub const DRT: &str = "drt"; // delegated rotation
    pub const RCT: &str = "rct"; // receipt
    pub const QRY: &str = "qry"; // query
    pub const RPY: &str = "rpy"; // reply

    pub static TUPLE: [&str; 8] = [ICP, ROT, IXN, DIP, DRT, RCT, QRY, RPY];
}

/// Ilker is a Matter subclass whose soft part carries the message type
/// (ilk) as a three char tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Ilker {
    base: BaseMatter,
}

impl Ilker {
    pub fn new(ilk: &str) -> Result<Self, MatterError> {
        if !ilk_dex::TUPLE.contains(&ilk) {
            return Err(MatterError::InvalidSoft(format!("Invalid ilk={}.", ilk)));
        }

        let base = BaseMatter::from_soft_and_code(ilk, mtr_dex::TAG3)?;
        Ok(Ilker { base })
    }

    pub fn ilk(&self) -> &str {
        self.base.soft()
    }
}

impl Parsable for Ilker {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if base.code() != mtr_dex::TAG3 || !ilk_dex::TUPLE.contains(&base.soft()) {
            return Err(MatterError::UnsupportedCode(format!(
                "Invalid ilk code={} soft={}.",
                base.code(),
                base.soft()
            )));
        }

        Ok(Ilker { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if base.code() != mtr_dex::TAG3 || !ilk_dex::TUPLE.contains(&base.soft()) {
            return Err(MatterError::UnsupportedCode(format!(
                "Invalid ilk code={} soft={}.",
                base.code(),
                base.soft()
            )));
        }

        Ok(Ilker { base })
    }
}

impl Matter for Ilker {
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
    fn test_ilker() {
        let ilker = Ilker::new(ilk_dex::ICP).unwrap();
        assert_eq!(ilker.qb64(), "Xicp");
        assert_eq!(ilker.ilk(), "icp");

        let mut stream = ilker.qb64b();
        let parsed = Ilker::from_qb64b(&mut stream, Some(true)).unwrap();
        assert_eq!(parsed.ilk(), "icp");
        assert!(stream.is_empty());
    }

    #[test]
    fn test_ilker_invalid() {
        assert!(Ilker::new("zzz").is_err());

        let mut stream = b"Xzzz".to_vec();
        assert!(Ilker::from_qb64b(&mut stream, None).is_err());
    }
}
