use thiserror::Error;

#[derive(Debug, Error)]
pub enum FxError {
    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Result type for FX operations
pub type Result<T> = std::result::Result<T, FxError>;
