//! Error types for travis-api

use thiserror::Error;

/// Lowest HTTP status treated as a server-side failure.
///
/// A response at or above this floor invalidates the whole batch it belongs to.
pub const FATAL_STATUS_FLOOR: u16 = 500;

/// Errors reported by a [`TravisApi`](crate::TravisApi) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout)
    #[error("Request error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The client could not be constructed from its configuration
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Convenience constructor for status errors.
    pub fn status_error(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message without the status prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Status { message, .. } => message,
            ApiError::Transport(message)
            | ApiError::Decode(message)
            | ApiError::Config(message) => message,
        }
    }

    /// Whether this error invalidates the whole in-flight batch.
    ///
    /// Server errors and failures that never reached the server are fatal;
    /// client errors (not found, forbidden, ...) and undecodable payloads
    /// only affect the resource they belong to.
    pub fn is_fatal(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status >= FATAL_STATUS_FLOOR,
            ApiError::Transport(_) | ApiError::Config(_) => true,
            ApiError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::Config(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::status_error(status.as_u16(), err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_fatal() {
        assert!(ApiError::status_error(500, "boom").is_fatal());
        assert!(ApiError::status_error(503, "unavailable").is_fatal());
        assert!(ApiError::Transport("connection refused".into()).is_fatal());
    }

    #[test]
    fn client_errors_are_recoverable() {
        assert!(!ApiError::status_error(404, "Not Found").is_fatal());
        assert!(!ApiError::status_error(403, "Forbidden").is_fatal());
        assert!(!ApiError::status_error(499, "odd").is_fatal());
        assert!(!ApiError::Decode("expected value".into()).is_fatal());
    }

    #[test]
    fn message_strips_status_prefix() {
        let err = ApiError::status_error(403, "Forbidden");
        assert_eq!(err.message(), "Forbidden");
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "HTTP 403: Forbidden");

        let err = ApiError::Transport("timed out".into());
        assert_eq!(err.message(), "timed out");
        assert_eq!(err.status(), None);
    }
}
