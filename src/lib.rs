//! Key lifecycle management and CESR stream annotation for self-certifying
//! identifiers.
//!
//! The crate has two halves. `keri::app::keeping` holds the key manager: a
//! durable keystore of deterministic (salty) or random (randy) keypair
//! sequences with two-slot rotation and pre-committed next keysets.
//! `keri::core::streaming` holds the annotator: a streaming decoder that
//! renders a CESR inception event one primitive per line.

mod errors;

pub use crate::errors::MatterError;

pub mod cesr;
pub mod keri;

pub use crate::cesr::Matter;

/// Initialize the library.
///
/// Must be called (directly or indirectly) before any signing or key
/// derivation so the underlying sodium library is ready.
pub fn init() -> Result<(), MatterError> {
    if sodiumoxide::init().is_err() {
        return Err(MatterError::Crypto(
            "Failed to initialize sodiumoxide".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }
}
