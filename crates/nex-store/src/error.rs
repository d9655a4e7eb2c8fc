use nex_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad input from the caller: missing field, low magnitude, unknown tier.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Token decoding produced nothing usable.
    #[error("token transform failed: {0}")]
    Transform(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
