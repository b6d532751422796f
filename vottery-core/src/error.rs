use thiserror::Error;

#[derive(Error, Debug)]
pub enum VotteryError {
    #[error("Entropy error: {0}")]
    EntropyError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Stale envelope: age {age_ms}ms exceeds maximum {max_ms}ms")]
    StaleEnvelope { age_ms: i64, max_ms: i64 },

    #[error("API error: {0}")]
    ApiError(String),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, VotteryError>;
