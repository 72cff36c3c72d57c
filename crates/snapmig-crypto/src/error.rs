/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid merkle input: {0}")]
    InvalidInput(String),

    #[error("leaf index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
