//! Error types for regprune-core

use thiserror::Error;

/// Result type alias using regprune-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for regprune
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Invalid exclusion rule
    #[error("Invalid exclusion rule '{rule}': {reason}")]
    InvalidExclusion { rule: String, reason: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid exclusion rule error
    pub fn invalid_exclusion(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExclusion {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Whether this error came from validating user input rather than I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::InvalidExclusion { .. } | Self::MissingField { .. }
        )
    }
}
