use thiserror::Error;

/// Client-side mistakes: anything that should come back as a 400.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed field `{field}`: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("magnitude {0} is below the minimum of 500000")]
    BelowFloor(f64),

    #[error("invalid tier `{0}` (expected NORMAL, HIGH or TOP)")]
    InvalidTier(String),
}

impl ValidationError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Malformed {
            field,
            reason: reason.into(),
        }
    }
}
