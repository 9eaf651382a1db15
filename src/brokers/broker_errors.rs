use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Login failed: remote rejected the credentials")]
    LoginFailed,

    #[error("One-time passcode required")]
    OtpRequired,

    #[error("Session expired, password required to log in again")]
    SessionExpired,

    #[error("No cached session for {0}")]
    SessionMissing(String),

    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    #[error("Unsupported institution: {0}")]
    UnsupportedInstitution(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidApiResponse(String),
}

impl From<reqwest::Error> for BrokerError {
    fn from(e: reqwest::Error) -> Self {
        BrokerError::ApiRequestFailed(e.to_string())
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(e: serde_json::Error) -> Self {
        BrokerError::InvalidApiResponse(e.to_string())
    }
}

/// Result type for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;
