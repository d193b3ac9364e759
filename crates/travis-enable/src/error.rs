//! Error types for travis-enable

use thiserror::Error;
use travis_api::ApiError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnableError {
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to sync account: {0}")]
    Sync(#[source] ApiError),

    #[error("failed to resolve repository information: {0}")]
    Resolve(#[source] ApiError),

    #[error("failed to enable builds for `{slug}`: {source}")]
    Dispatch {
        slug: String,
        #[source]
        source: ApiError,
    },

    #[error("dispatch interrupted after {completed} of {total} requests")]
    Interrupted { completed: usize, total: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl EnableError {
    /// HTTP status of the remote failure behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            EnableError::Sync(e) | EnableError::Resolve(e) | EnableError::Api(e) => e.status(),
            EnableError::Dispatch { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the error was raised before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EnableError::InvalidOption(_) | EnableError::InvalidInput(_)
        )
    }
}

/// Result type for travis-enable operations
pub type Result<T> = std::result::Result<T, EnableError>;
