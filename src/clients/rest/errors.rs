//! Error types for the path-level REST client.
//!
//! - [`RestError::InvalidPath`]: When a path is empty after normalization
//! - [`RestError::Http`]: Wraps underlying transport errors
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_client::clients::rest::{RestClient, RestError};
//!
//! match client.get("uploads", None).await {
//!     Ok(response) => println!("Uploads: {}", response.body),
//!     Err(RestError::InvalidPath { path }) => println!("Invalid path: {path}"),
//!     Err(RestError::Http(e)) => println!("HTTP error: {e}"),
//! }
//! ```

use crate::clients::HttpError;
use thiserror::Error;

/// Error type for path-level REST operations.
///
/// # Example
///
/// ```rust
/// use cms_client::clients::rest::RestError;
///
/// let error = RestError::InvalidPath { path: "".to_string() };
/// assert!(error.to_string().contains("Invalid"));
/// ```
#[derive(Debug, Error)]
pub enum RestError {
    /// The path is empty after normalization.
    #[error("Invalid REST API path: {path}")]
    InvalidPath {
        /// The invalid path that was provided.
        path: String,
    },

    /// A transport-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),
}

// Verify RestError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{HttpResponseError, RateLimitExceededError};
    use serde_json::json;

    #[test]
    fn test_invalid_path_error_includes_path_in_message() {
        let error = RestError::InvalidPath {
            path: "//".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid REST API path: //");
    }

    #[test]
    fn test_from_http_error_conversion() {
        let http_error = HttpError::Response(HttpResponseError {
            code: 500,
            message: r#"{"status":500}"#.to_string(),
            body: json!({}),
            retry_after: None,
            error_reference: None,
        });

        let rest_error: RestError = http_error.into();
        assert!(matches!(rest_error, RestError::Http(HttpError::Response(_))));
    }

    #[test]
    fn test_rate_limit_exhaustion_passes_through() {
        let rest_error = RestError::Http(HttpError::RateLimitExceeded(RateLimitExceededError {
            tries: 5,
            retry_after: None,
            message: "{}".to_string(),
            error_reference: None,
        }));

        assert!(rest_error.to_string().contains("5 consecutive attempts"));
    }
}
