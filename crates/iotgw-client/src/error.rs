//! Error types for client operations

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status} ({kind}): {message}")]
    ServerError {
        status: u16,
        kind: String,
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Test server fixtures were rejected
    #[error("Failed to seed test store: {0}")]
    Seed(#[from] iotgw_core::ServiceError),
}

impl ClientError {
    /// Create a server error from status code, kind and message
    pub fn server_error(status: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// HTTP status of a server error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error kind reported by the server
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::ServerError { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Human-readable message reported by the server
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::ServerError { message, .. } => Some(message),
            _ => None,
        }
    }
}
