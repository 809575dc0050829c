use thiserror::Error;

/// Result alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors produced by the HTTP client wrapper.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Configuration is missing or malformed.
    #[error("invalid api configuration: {0}")]
    Config(String),
    /// Request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),
    /// Backend answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided problem detail, when present.
        detail: Option<String>,
    },
    /// Success body did not match the expected shape.
    #[error("response decode failure: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided detail for [`ApiError::Status`], `None` otherwise.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}
