use crate::cesr::counting::Counter;
use crate::cesr::diger::Diger;
use crate::cesr::ilker::{ilk_dex, Ilker};
use crate::cesr::number::Number;
use crate::cesr::prefixer::Prefixer;
use crate::cesr::tholder::Tholder;
use crate::cesr::traitor::Traitor;
use crate::cesr::verfer::Verfer;
use crate::cesr::verser::Verser;
use crate::cesr::{sniff, Colds, Parsable};
use crate::errors::MatterError;
use crate::keri::core::structing::{Sealer, CLANS};
use crate::keri::KERIError;
use crate::Matter;
use std::fmt::Write;

/// Streamer carries a sniffable CESR stream.
#[derive(Debug, Clone)]
pub struct Streamer {
    stream: Vec<u8>,
}

impl Streamer {
    pub fn new(stream: &[u8]) -> Self {
        Streamer {
            stream: stream.to_vec(),
        }
    }

    pub fn stream(&self) -> &[u8] {
        &self.stream
    }

    /// Stream as expanded qb64 text
    pub fn text(&self) -> &[u8] {
        &self.stream
    }
}

fn ferr(field: &str, err: MatterError) -> KERIError {
    KERIError::Parse(field.to_string(), err.to_string())
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

/// Slice a counted sub frame of 4 * count bytes off the front of the
/// stream.
fn take_frame(ims: &mut Vec<u8>, count: u64, field: &str) -> Result<Vec<u8>, KERIError> {
    let size = (count as usize) * 4;
    if ims.len() < size {
        return Err(KERIError::Parse(
            field.to_string(),
            format!("frame of {} bytes exceeds remaining stream", size),
        ));
    }

    Ok(ims.drain(..size).collect())
}

/// Annotate a CESR stream of inception event messages.
///
/// Returns one line per primitive of the form `<indent><qb64> # <label>`
/// where counters open an indented sub scope covering exactly the
/// quadlets they count. Every byte of the input is consumed; a byte that
/// does not decode as the expected field raises a parse error naming the
/// field.
pub fn annot(ims: &[u8]) -> Result<String, KERIError> {
    let mut ims = ims.to_vec();
    let mut oms = String::new();
    let mut indent = 0usize;

    while !ims.is_empty() {
        match sniff(&ims)? {
            Colds::Txt => annot_evt(&mut ims, &mut oms, &mut indent)?,
            Colds::Bny => {
                // The qb2 path is reserved until a binary annotation
                // format is settled
                return Err(KERIError::Parse(
                    "stream".to_string(),
                    "binary qb2 frame annotation not supported".to_string(),
                ));
            }
        }
    }

    Ok(oms)
}

fn annot_evt(ims: &mut Vec<u8>, oms: &mut String, indent: &mut usize) -> Result<(), KERIError> {
    let ctr = Counter::from_qb64b(ims, Some(true)).map_err(|e| ferr("message", e))?;
    let _ = writeln!(
        oms,
        "{}{} # Key Event Counter {} count={} quadlets",
        pad(*indent),
        ctr.qb64(),
        ctr.name(),
        ctr.count()
    );
    *indent += 1;

    // version
    let verser = Verser::from_qb64b(ims, Some(true)).map_err(|e| ferr("v", e))?;
    let versage = verser.versage();
    let _ = writeln!(
        oms,
        "{}{} # 'v' version Verser {} proto={} vrsn={}.{:02}",
        pad(*indent),
        verser.qb64(),
        verser.name(),
        versage.proto,
        versage.vrsn.major,
        versage.vrsn.minor
    );

    // ilk
    let ilker = Ilker::from_qb64b(ims, Some(true)).map_err(|e| ferr("t", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 't' message type Ilker {} ilk={}",
        pad(*indent),
        ilker.qb64(),
        ilker.name(),
        ilker.ilk()
    );

    if ilker.ilk() != ilk_dex::ICP {
        return Err(KERIError::Parse(
            "t".to_string(),
            format!("unsupported ilk={} for annotation", ilker.ilk()),
        ));
    }

    // said
    let diger = Diger::from_qb64b(ims, Some(true)).map_err(|e| ferr("d", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'd' SAID Diger {}",
        pad(*indent),
        diger.qb64(),
        diger.name()
    );

    // aid pre
    let prefixer = Prefixer::from_qb64b(ims, Some(true)).map_err(|e| ferr("i", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'i' AID Prefixer {}",
        pad(*indent),
        prefixer.qb64(),
        prefixer.name()
    );

    // sn
    let number = Number::from_qb64b(ims, Some(true)).map_err(|e| ferr("s", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 's' sequence number Number {} sn={}",
        pad(*indent),
        number.qb64(),
        number.name(),
        number.snh()
    );

    // signing threshold
    let tholder = Tholder::from_limen(ims, Some(true)).map_err(|e| ferr("kt", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'kt' Tholder signing threshold={}",
        pad(*indent),
        tholder.limen(),
        tholder.sith()
    );

    // signing key list
    let ctr = Counter::from_qb64b(ims, Some(true)).map_err(|e| ferr("k", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'k' Signing Key List Counter {} count={} quadlets",
        pad(*indent),
        ctr.qb64(),
        ctr.name(),
        ctr.count()
    );
    *indent += 1;
    let mut frame = take_frame(ims, ctr.count(), "k")?;
    while !frame.is_empty() {
        let verfer = Verfer::from_qb64b(&mut frame, Some(true)).map_err(|e| ferr("k", e))?;
        let _ = writeln!(
            oms,
            "{}{} # key Verfer {}",
            pad(*indent),
            verfer.qb64(),
            verfer.name()
        );
    }
    *indent -= 1;

    // rotation threshold
    let tholder = Tholder::from_limen(ims, Some(true)).map_err(|e| ferr("nt", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'nt' Tholder rotation threshold={}",
        pad(*indent),
        tholder.limen(),
        tholder.sith()
    );

    // next key digest list
    let ctr = Counter::from_qb64b(ims, Some(true)).map_err(|e| ferr("n", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'n' Rotation Key Digest List Counter {} count={} quadlets",
        pad(*indent),
        ctr.qb64(),
        ctr.name(),
        ctr.count()
    );
    *indent += 1;
    let mut frame = take_frame(ims, ctr.count(), "n")?;
    while !frame.is_empty() {
        let diger = Diger::from_qb64b(&mut frame, Some(true)).map_err(|e| ferr("n", e))?;
        let _ = writeln!(
            oms,
            "{}{} # key digest Diger {}",
            pad(*indent),
            diger.qb64(),
            diger.name()
        );
    }
    *indent -= 1;

    // witness backer threshold
    let tholder = Tholder::from_limen(ims, Some(true)).map_err(|e| ferr("bt", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'bt' Tholder Backer (witness) threshold={}",
        pad(*indent),
        tholder.limen(),
        tholder.sith()
    );

    // witness backer list
    let ctr = Counter::from_qb64b(ims, Some(true)).map_err(|e| ferr("b", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'b' Backer (witness) List Counter {} count={} quadlets",
        pad(*indent),
        ctr.qb64(),
        ctr.name(),
        ctr.count()
    );
    *indent += 1;
    let mut frame = take_frame(ims, ctr.count(), "b")?;
    while !frame.is_empty() {
        let prefixer = Prefixer::from_qb64b(&mut frame, Some(true)).map_err(|e| ferr("b", e))?;
        let _ = writeln!(
            oms,
            "{}{} # AID Prefixer {}",
            pad(*indent),
            prefixer.qb64(),
            prefixer.name()
        );
    }
    *indent -= 1;

    // config trait list
    let ctr = Counter::from_qb64b(ims, Some(true)).map_err(|e| ferr("c", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'c' Config Trait List Counter {} count={} quadlets",
        pad(*indent),
        ctr.qb64(),
        ctr.name(),
        ctr.count()
    );
    *indent += 1;
    let mut frame = take_frame(ims, ctr.count(), "c")?;
    while !frame.is_empty() {
        let traitor = Traitor::from_qb64b(&mut frame, Some(true)).map_err(|e| ferr("c", e))?;
        let _ = writeln!(
            oms,
            "{}{} # trait Traitor {} trait={}",
            pad(*indent),
            traitor.qb64(),
            traitor.name(),
            traitor.trait_()
        );
    }
    *indent -= 1;

    // seal (anchor) list
    let ctr = Counter::from_qb64b(ims, Some(true)).map_err(|e| ferr("a", e))?;
    let _ = writeln!(
        oms,
        "{}{} # 'a' Seal List Counter {} count={} quadlets",
        pad(*indent),
        ctr.qb64(),
        ctr.name(),
        ctr.count()
    );
    *indent += 1;
    let mut frame = take_frame(ims, ctr.count(), "a")?;
    while !frame.is_empty() {
        let sctr = Counter::from_qb64b(&mut frame, Some(true)).map_err(|e| ferr("a", e))?;
        let _ = writeln!(
            oms,
            "{}{} # Seal Counter {} count={} quadlets",
            pad(*indent),
            sctr.qb64(),
            sctr.name(),
            sctr.count()
        );
        *indent += 1;

        let clan = CLANS.get(sctr.code()).copied().ok_or_else(|| {
            KERIError::Parse(
                "a".to_string(),
                format!("unknown seal clan for counter code={}", sctr.code()),
            )
        })?;

        let mut subframe = take_frame(&mut frame, sctr.count(), "a")?;
        while !subframe.is_empty() {
            let sealer = Sealer::from_stream(clan, &mut subframe, Some(true))
                .map_err(|e| ferr("a", e))?;
            let _ = writeln!(
                oms,
                "{}{} # seal Sealer {}",
                pad(*indent),
                sealer.qb64(),
                sealer.name()
            );
            *indent += 1;
            for (label, value) in sealer.crew() {
                let _ = writeln!(oms, "{}#  '{}' = {}", pad(*indent), label, value);
            }
            *indent -= 1;
        }
        *indent -= 1;
    }
    *indent -= 1;

    *indent -= 1;
    Ok(())
}
