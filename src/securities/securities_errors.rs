use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::market_data::MarketDataError;

/// Custom error type for security-related operations
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unsupported security: {0}")]
    UnsupportedSecurity(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for SecurityError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => SecurityError::NotFound("Record not found".to_string()),
            _ => SecurityError::DatabaseError(err.to_string()),
        }
    }
}

impl From<MarketDataError> for SecurityError {
    fn from(err: MarketDataError) -> Self {
        SecurityError::ProviderError(err.to_string())
    }
}

impl From<serde_json::Error> for SecurityError {
    fn from(err: serde_json::Error) -> Self {
        SecurityError::InvalidData(err.to_string())
    }
}

/// Result type for security operations
pub type Result<T> = std::result::Result<T, SecurityError>;
