//! Error types for the primitive codec layer.

use thiserror::Error;

/// Errors raised while composing or parsing qualified cryptographic material.
#[derive(Error, Debug)]
pub enum MatterError {
    #[error("Empty material: {0}")]
    EmptyMaterial(String),

    #[error("Shortage: {0}")]
    Shortage(String),

    #[error("Unexpected code: {0}")]
    UnexpectedCode(String),

    #[error("Unexpected count code: {0}")]
    UnexpectedCountCode(String),

    #[error("Unexpected op code: {0}")]
    UnexpectedOpCode(String),

    #[error("Unsupported code: {0}")]
    UnsupportedCode(String),

    #[error("Invalid code size: {0}")]
    InvalidCodeSize(String),

    #[error("Invalid soft: {0}")]
    InvalidSoft(String),

    #[error("Soft material: {0}")]
    SoftMaterial(String),

    #[error("Raw material: {0}")]
    RawMaterial(String),

    #[error("Invalid variable raw size: {0}")]
    InvalidVarRawSize(String),

    #[error("Invalid variable index: {0}")]
    InvalidVarIndex(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Value error: {0}")]
    Value(String),

    #[error("Cold start error: {0}")]
    ColdStart(String),
}
