use thiserror::Error;

/// Errors from the key-value store layer. Underlying environment errors
/// are fatal and propagate unchanged.
#[derive(Debug, Error)]
pub enum DBError {
    #[error("DB IoError: {0}")]
    IoError(String),

    #[error("Filer error: {0}")]
    FilerError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Key error: {0}")]
    KeyError(String),

    #[error("Value error: {0}")]
    ValueError(String),

    #[error("Database not opened")]
    DbClosed,

    #[error("Environment error: {0}")]
    EnvError(#[from] heed::Error),
}
