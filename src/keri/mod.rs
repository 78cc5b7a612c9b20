//! Core, database, and application layers for self-certifying identifier
//! key management.

pub mod app;
pub mod core;
pub mod db;
pub mod help;

use crate::errors::MatterError;
use crate::keri::db::errors::DBError;
use crate::keri::db::subing::SuberError;
use thiserror::Error;

/// Top level error for key lifecycle operations and stream annotation
#[derive(Debug, Error)]
pub enum KERIError {
    #[error("Already incepted pre={0}.")]
    AlreadyIncepted(String),

    #[error("Attempt to use nonexistent pre={0}.")]
    UnknownPrefix(String),

    #[error("Attempt to rotate nontransferable pre={0}.")]
    NonTransferable(String),

    #[error("Missing prikey in db for pubkey={0}.")]
    MissingSecret(String),

    #[error("Prefix vanished during update for pre={0}.")]
    PrefixVanished(String),

    #[error("Unsupported creation algorithm={0}.")]
    UnsupportedAlgorithm(String),

    #[error("Parse error at field '{0}': {1}")]
    Parse(String, String),

    #[error("Value error: {0}")]
    Value(String),

    #[error(transparent)]
    Matter(#[from] MatterError),

    #[error(transparent)]
    DB(#[from] DBError),

    #[error(transparent)]
    Suber(#[from] SuberError),
}
