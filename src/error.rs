//! Error types for client configuration.
//!
//! This module contains the error type returned when configuration values
//! fail validation.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use cms_client::{ApiToken, ConfigError};
//!
//! let result = ApiToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API token cannot be empty.
    #[error("API token cannot be empty. Please provide a valid API access token.")]
    EmptyApiToken,

    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Expected a URL like 'https://site-api.example.com'.")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Environment name is invalid.
    #[error("Invalid environment name '{name}'. Expected lowercase letters, digits, '-' or '_'.")]
    InvalidEnvironment {
        /// The invalid name that was provided.
        name: String,
    },

    /// Retry or polling policy values are out of range.
    #[error("Invalid retry policy: {reason}")]
    InvalidRetryPolicy {
        /// The reason the policy was rejected.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. It must be set before building.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
