//! Transport-level error types.
//!
//! - [`HttpResponseError`]: A final non-2xx response, with its raw payload
//! - [`RateLimitExceededError`]: Too many consecutive 429 responses
//! - [`InvalidHttpRequestError`]: A request that failed validation before sending
//! - [`HttpError`]: Unified error type encompassing all transport errors
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_client::clients::HttpError;
//!
//! match client.request(request).await {
//!     Ok(response) => println!("Success: {}", response.body),
//!     Err(HttpError::Response(e)) => println!("API error {}: {}", e.code, e.message),
//!     Err(HttpError::RateLimitExceeded(e)) => println!("Gave up after {} tries", e.tries),
//!     Err(HttpError::Cancelled) => println!("Cancelled"),
//!     Err(e) => println!("Other: {e}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when a request receives a final non-successful response.
///
/// The `body` keeps the raw JSON payload so higher layers can classify the
/// failure and extract field-level details.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Serialized error summary in JSON format.
    pub message: String,
    /// The raw response body.
    pub body: serde_json::Value,
    /// Seconds the server asked the client to wait, if any.
    pub retry_after: Option<f64>,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

/// Error returned after too many consecutive `429 Too Many Requests` responses.
#[derive(Debug, Error, Clone)]
#[error("Rate limit still exceeded after {tries} consecutive attempts. Last message: {message}")]
pub struct RateLimitExceededError {
    /// The number of consecutive 429 responses received.
    pub tries: u32,
    /// The retry hint of the last response, in seconds.
    pub retry_after: Option<f64>,
    /// Serialized error message from the last response.
    pub message: String,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

/// Error returned when an HTTP request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A request body was provided without specifying the body type.
    #[error("Cannot set a body without also setting body_type.")]
    MissingBodyType,

    /// A PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },
}

/// Unified error type for all transport errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A final non-2xx response.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Consecutive 429 responses exhausted the retry budget.
    #[error(transparent)]
    RateLimitExceeded(#[from] RateLimitExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// The caller's cancellation token fired.
    #[error("Request was cancelled")]
    Cancelled,

    /// Network, timeout or TLS error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpError>();
};
