use crate::cesr::number::Number;
use crate::cesr::{bex_dex, hards, num_dex, BaseMatter, Parsable, SIZES};
use crate::errors::MatterError;
use crate::Matter;

/// Bexter is a Matter subclass holding variable sized Base64 only text.
/// A leading 'A' in the text is ambiguous with the pad and is lost on
/// round trip, so callers must not start bext with 'A'.
#[derive(Debug, Clone, PartialEq)]
pub struct Bexter {
    base: BaseMatter,
}

impl Bexter {
    pub fn new(bext: &str) -> Result<Self, MatterError> {
        if !bext
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(MatterError::InvalidSoft(format!(
                "Non Base64 chars in bext={}.",
                bext
            )));
        }

        let raw = Self::rawify(bext)?;
        let base = BaseMatter::new(Some(&raw), Some(bex_dex::STR_B64_L0), None, None)?;
        Ok(Bexter { base })
    }

    fn rawify(bext: &str) -> Result<Vec<u8>, MatterError> {
        let ts = bext.len() % 4; // trailing size in chars
        let ws = (4 - ts) % 4; // pre conversion wad of prepad chars
        let ls = (3 - ts) % 3; // post conversion lead size in bytes

        let mut base = "A".repeat(ws).into_bytes();
        base.extend_from_slice(bext.as_bytes());
        let paw = crate::cesr::decode_b64(&base)?;

        Ok(paw[ls..].to_vec())
    }

    /// Recover the Base64 text, stripping the pad chars reintroduced by
    /// the lead bytes.
    pub fn bext(&self) -> String {
        let size = SIZES[self.base.code()];
        let text = self.base.qb64()[size.hs + size.ss..].to_string();

        let ws = if size.ls == 0 {
            usize::from(text.starts_with('A'))
        } else {
            (size.ls + 1) % 4
        };

        text[ws..].to_string()
    }
}

impl Parsable for Bexter {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64b(data, strip)?;
        if !bex_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Bexter { base })
    }

    fn from_qb2(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb2(data, strip)?;
        if !bex_dex::TUPLE.contains(&base.code()) {
            return Err(MatterError::UnsupportedCode(String::from(base.code())));
        }

        Ok(Bexter { base })
    }
}

impl Matter for Bexter {
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

/// Limen primitive variants behind a Tholder
#[derive(Debug, Clone, PartialEq)]
enum Limen {
    Num(Number),
    Bex(Bexter),
}

/// Tholder holds a signing threshold, either an unweighted count or a
/// weighted expression of fractional clauses. The limen is the qualified
/// primitive carrying the threshold in a stream: a Number for unweighted
/// thresholds, a Bexter for weighted ones.
///
/// Weighted expressions swap the non-Base64 chars of the sith for Base64
/// stand-ins within the limen: '/' becomes 's', ',' becomes 'c' and '&'
/// (clause separator) becomes 'a'. So sith "1/2,1/2" rides as "1s2c1s2".
#[derive(Debug, Clone, PartialEq)]
pub struct Tholder {
    limen: Limen,
}

impl Tholder {
    /// Build from a sith expression: a hex count such as "2" or a
    /// weighted expression such as "1/2,1/2" or "1/2,1/2&1".
    pub fn from_sith(sith: &str) -> Result<Self, MatterError> {
        if sith.is_empty() {
            return Err(MatterError::Value("Empty sith.".to_string()));
        }

        if sith.contains('/') || sith.contains(',') || sith.contains('&') {
            let bext = sith.replace('/', "s").replace(',', "c").replace('&', "a");
            let bexter = Bexter::new(&bext)?;
            return Ok(Tholder {
                limen: Limen::Bex(bexter),
            });
        }

        let num = u64::from_str_radix(sith, 16)
            .map_err(|_| MatterError::Value(format!("Invalid sith={}.", sith)))?;
        Ok(Tholder {
            limen: Limen::Num(Number::new(num)?),
        })
    }

    /// Extract the limen primitive from the front of a qb64 stream.
    pub fn from_limen(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let first = *data
            .first()
            .ok_or_else(|| MatterError::Shortage("Empty limen material.".to_string()))?;
        let hs = *hards()
            .get(&first)
            .ok_or_else(|| MatterError::UnexpectedCode(format!("Invalid limen start={}.", first as char)))?;

        if data.len() < hs {
            return Err(MatterError::Shortage(format!(
                "Need {} more characters.",
                hs - data.len()
            )));
        }
        let hard = std::str::from_utf8(&data[..hs])
            .map_err(|_| MatterError::Conversion("Invalid UTF-8 in limen code.".to_string()))?;

        if num_dex::TUPLE.contains(&hard) {
            Ok(Tholder {
                limen: Limen::Num(Number::from_qb64b(data, strip)?),
            })
        } else if bex_dex::TUPLE.contains(&hard) {
            Ok(Tholder {
                limen: Limen::Bex(Bexter::from_qb64b(data, strip)?),
            })
        } else {
            Err(MatterError::UnexpectedCode(format!(
                "Invalid limen code={}.",
                hard
            )))
        }
    }

    /// Qualified Base64 of the limen primitive
    pub fn limen(&self) -> String {
        match &self.limen {
            Limen::Num(number) => number.qb64(),
            Limen::Bex(bexter) => bexter.qb64(),
        }
    }

    /// Human readable threshold expression
    pub fn sith(&self) -> String {
        match &self.limen {
            Limen::Num(number) => format!("{:x}", number.sn()),
            Limen::Bex(bexter) => bexter
                .bext()
                .replace('s', "/")
                .replace('c', ",")
                .replace('a', "&"),
        }
    }

    pub fn weighted(&self) -> bool {
        matches!(self.limen, Limen::Bex(_))
    }

    /// Unweighted threshold count, None when weighted
    pub fn num(&self) -> Option<u64> {
        match &self.limen {
            Limen::Num(number) => Some(number.sn()),
            Limen::Bex(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bexter_round_trip() {
        for bext in ["B", "BB", "BBB", "BBBB", "1s2c1s2", "1s2c1s2c1s2"] {
            let bexter = Bexter::new(bext).unwrap();
            assert_eq!(bexter.bext(), bext);

            let mut stream = bexter.qb64b();
            let parsed = Bexter::from_qb64b(&mut stream, Some(true)).unwrap();
            assert_eq!(parsed.bext(), bext);
            assert!(stream.is_empty());
        }
    }

    #[test]
    fn test_bexter_rejects_non_b64() {
        assert!(Bexter::new("1/2").is_err());
    }

    #[test]
    fn test_tholder_unweighted() {
        let tholder = Tholder::from_sith("1").unwrap();
        assert!(!tholder.weighted());
        assert_eq!(tholder.num(), Some(1));
        assert_eq!(tholder.sith(), "1");
        assert_eq!(tholder.limen(), "MAAB");

        let tholder = Tholder::from_sith("a").unwrap();
        assert_eq!(tholder.num(), Some(10));
        assert_eq!(tholder.sith(), "a");
    }

    #[test]
    fn test_tholder_weighted() {
        let tholder = Tholder::from_sith("1/2,1/2").unwrap();
        assert!(tholder.weighted());
        assert_eq!(tholder.num(), None);
        assert_eq!(tholder.sith(), "1/2,1/2");

        let mut stream = tholder.limen().into_bytes();
        let parsed = Tholder::from_limen(&mut stream, Some(true)).unwrap();
        assert_eq!(parsed.sith(), "1/2,1/2");
        assert!(stream.is_empty());
    }

    #[test]
    fn test_tholder_from_limen_number() {
        let mut stream = b"MAABextra".to_vec();
        let tholder = Tholder::from_limen(&mut stream, Some(true)).unwrap();
        assert_eq!(tholder.num(), Some(1));
        assert_eq!(stream, b"extra");
    }

    #[test]
    fn test_tholder_invalid() {
        assert!(Tholder::from_sith("").is_err());
        assert!(Tholder::from_sith("zz").is_err());
    }
}
