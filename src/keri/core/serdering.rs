/// Serder carries one serialized event. The event is opaque here: it is
/// composed and verified elsewhere, this type just owns the raw bytes for
/// storage and transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Serder {
    raw: Vec<u8>,
}

impl Serder {
    pub fn new(raw: Vec<u8>) -> Self {
        Serder { raw }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn size(&self) -> usize {
        self.raw.len()
    }
}
