use crate::cesr::{b64_to_int, int_to_b64, mtr_dex, BaseMatter, Parsable, Versionage};
use crate::errors::MatterError;
use crate::Matter;

/// Protocol and version carried by a Verser
#[derive(Debug, Clone, PartialEq)]
pub struct Versage {
    pub proto: String,
    pub vrsn: Versionage,
}

/// Verser is a Matter subclass whose soft part carries the protocol genus
/// and version of the message that follows. The soft is seven Base64
/// chars: four protocol chars, one major char, two minor chars.
#[derive(Debug, Clone, PartialEq)]
pub struct Verser {
    base: BaseMatter,
}

impl Verser {
    pub fn new(proto: Option<&str>, vrsn: Option<Versionage>) -> Result<Self, MatterError> {
        let proto = proto.unwrap_or("KERI");
        let vrsn = vrsn.unwrap_or(crate::cesr::VRSN_2_0);

        if proto.len() != 4 {
            return Err(MatterError::InvalidSoft(format!(
                "Invalid protocol={} for Verser.",
                proto
            )));
        }

        let soft = format!(
            "{}{}{}",
            proto,
            int_to_b64(vrsn.major, 1),
            int_to_b64(vrsn.minor, 2)
        );
        let base = BaseMatter::from_soft_and_code(&soft, mtr_dex::TAG7)?;
        Ok(Verser { base })
    }

    pub fn versage(&self) -> Versage {
        let soft = self.base.soft();
        Versage {
            proto: soft[..4].to_string(),
            vrsn: Versionage {
                major: b64_to_int(&soft[4..5]).unwrap_or(0),
                minor: b64_to_int(&soft[5..7]).unwrap_or(0),
            },
        }
    }
}

impl Parsable for Verser {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if base.code() != mtr_dex::TAG7 {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Verser { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if base.code() != mtr_dex::TAG7 {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Verser { base })
    }
}

impl Matter for Verser {
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
    use crate::cesr::VRSN_2_0;

    #[test]
    fn test_verser_default() {
        let verser = Verser::new(None, None).unwrap();
        assert_eq!(verser.qb64(), "YKERICAA");

        let versage = verser.versage();
        assert_eq!(versage.proto, "KERI");
        assert_eq!(versage.vrsn, VRSN_2_0);
    }

    #[test]
    fn test_verser_round_trip() {
        let verser = Verser::new(
            Some("ACDC"),
            Some(Versionage { major: 1, minor: 42 }),
        )
        .unwrap();

        let mut stream = verser.qb64b();
        let parsed = Verser::from_qb64b(&mut stream, Some(true)).unwrap();
        assert!(stream.is_empty());

        let versage = parsed.versage();
        assert_eq!(versage.proto, "ACDC");
        assert_eq!(versage.vrsn.major, 1);
        assert_eq!(versage.vrsn.minor, 42);
    }

    #[test]
    fn test_verser_bad_proto() {
        assert!(Verser::new(Some("TOOLONG"), None).is_err());
    }
}
