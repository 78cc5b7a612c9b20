use crate::cesr::{tag_dex, BaseMatter, Parsable};
use crate::errors::MatterError;
use crate::Matter;

/// Codex of configuration traits
pub mod trait_dex {
    pub const EST_ONLY: &str = "EO"; // only establishment events allowed
    pub const DO_NOT_DELEGATE: &str = "DND"; // delegation not allowed
    pub const NO_BACKERS: &str = "NB"; // no registrar backers
    pub const BACKERS: &str = "RB"; // registrar backers allowed

    pub static TUPLE: [&str; 4] = [EST_ONLY, DO_NOT_DELEGATE, NO_BACKERS, BACKERS];
}

/// Traitor is a Matter subclass whose soft part carries a configuration
/// trait as a tag. The tag code is selected by the trait length.
#[derive(Debug, Clone, PartialEq)]
pub struct Traitor {
    base: BaseMatter,
}

impl Traitor {
    pub fn new(trait_: &str) -> Result<Self, MatterError> {
        if trait_.is_empty() || trait_.len() > tag_dex::TUPLE.len() {
            return Err(MatterError::InvalidSoft(format!(
                "Invalid trait size={}.",
                trait_.len()
            )));
        }

        let code = tag_dex::TUPLE[trait_.len() - 1];
        let base = BaseMatter::from_soft_and_code(trait_, code)?;
        Ok(Traitor { base })
    }

    pub fn trait_(&self) -> &str {
        self.base.soft()
    }
}

impl Parsable for Traitor {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if !tag_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Traitor { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if !tag_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Traitor { base })
    }
}

impl Matter for Traitor {
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
    use crate::cesr::mtr_dex;

    #[test]
    fn test_traitor_codes_by_length() {
        let traitor = Traitor::new(trait_dex::EST_ONLY).unwrap();
        assert_eq!(traitor.code(), mtr_dex::TAG2);
        assert_eq!(traitor.trait_(), "EO");

        let traitor = Traitor::new(trait_dex::DO_NOT_DELEGATE).unwrap();
        assert_eq!(traitor.code(), mtr_dex::TAG3);
        assert_eq!(traitor.qb64(), "XDND");
    }

    #[test]
    fn test_traitor_round_trip() {
        for trait_ in trait_dex::TUPLE {
            let traitor = Traitor::new(trait_).unwrap();
            let mut stream = traitor.qb64b();
            let parsed = Traitor::from_qb64b(&mut stream, Some(true)).unwrap();
            assert_eq!(parsed.trait_(), trait_);
            assert!(stream.is_empty());
        }
    }

    #[test]
    fn test_traitor_invalid() {
        assert!(Traitor::new("").is_err());
        assert!(Traitor::new("WAYTOOLONGTAG").is_err());
    }
}
