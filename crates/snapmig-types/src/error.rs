use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid tryte {tryte:?} at position {position}")]
    InvalidTryte { tryte: char, position: usize },

    #[error("not a migration address: {0}")]
    NotMigrationAddress(String),

    #[error("unknown address type: {0}")]
    UnknownAddressType(u8),
}
