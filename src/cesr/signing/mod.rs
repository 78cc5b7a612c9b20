pub mod salter;
pub mod signer;

pub use salter::Salter;
pub use signer::Signer;

use crate::cesr::cigar::Cigar;
use crate::cesr::indexing::Siger;

/// A signature in either the indexed or unindexed domain
#[derive(Debug, Clone)]
pub enum Sigmat {
    Indexed(Siger),
    NonIndexed(Cigar),
}
