//! Error types for registry API calls

use regprune_core::retry::{HttpStatusError, HttpStatusPredicate, RetryPredicate};
use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failure of a listing or deletion call
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The API answered with a non-success status
    #[error("Registry API returned {status} for {operation}: {message}")]
    Api {
        operation: String,
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a response (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be understood
    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse { operation: String, message: String },

    /// Transport failure reported by a non-HTTP implementation
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl RegistryError {
    pub fn api(
        operation: impl Into<String>,
        status: u16,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            operation: operation.into(),
            status,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_response(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether the API rejected the credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }
}

impl HttpStatusError for RegistryError {
    fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidResponse { .. } | Self::Transport { .. } => None,
        }
    }
}

/// Retries transient HTTP failures; malformed responses are permanent
#[derive(Debug, Clone, Default)]
pub struct RegistryRetryPredicate {
    http: HttpStatusPredicate,
}

impl RetryPredicate<RegistryError> for RegistryRetryPredicate {
    fn should_retry(&self, error: &RegistryError) -> bool {
        match error {
            RegistryError::Api { .. }
            | RegistryError::Http(_)
            | RegistryError::Transport { .. } => self.http.should_retry(error),
            RegistryError::InvalidResponse { .. } => false,
        }
    }
}
