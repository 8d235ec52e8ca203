//! Error types for the application

use thiserror::Error;

/// Result type alias using our RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Malformed or missing signal/command fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Exchange or chat API answered with a failure code
    #[error("Upstream error (code {code}): {message}")]
    Upstream { code: i64, message: String },

    /// Unknown symbol or other lookup without a fallback
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Request signing errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error category used by the HTTP and chat surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Upstream,
    NotFound,
    Configuration,
}

impl RelayError {
    /// Build an upstream error from an exchange return code and message
    pub fn upstream(code: i64, message: impl Into<String>) -> Self {
        RelayError::Upstream {
            code,
            message: message.into(),
        }
    }

    /// Classify this error into one of the four user-facing categories
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Validation(_) => ErrorKind::Validation,
            RelayError::NotFound(_) => ErrorKind::NotFound,
            RelayError::Configuration(_) => ErrorKind::Configuration,
            RelayError::Upstream { .. }
            | RelayError::HttpRequest(_)
            | RelayError::JsonParse(_)
            | RelayError::Authentication(_)
            | RelayError::InvalidResponse(_)
            | RelayError::Internal(_) => ErrorKind::Upstream,
        }
    }
}
