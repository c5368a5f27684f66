//! Resource-level error taxonomy.
//!
//! [`ResourceError`] is the closed set of failures a resource call can
//! surface. Transport failures are classified by HTTP status and the error
//! code in the body:
//!
//! | Status | Variant |
//! |---|---|
//! | 401 | [`ResourceError::Unauthorized`] |
//! | 403 | [`ResourceError::Forbidden`] |
//! | 404 | [`ResourceError::NotFound`] |
//! | 409, or 422 with a conflict code | [`ResourceError::Conflict`] |
//! | 400, 422 | [`ResourceError::ValidationFailed`] |
//! | 429 | [`ResourceError::RateLimited`] |
//! | 5xx | [`ResourceError::ServerError`] |
//! | anything else | [`ResourceError::Unknown`] |
//!
//! Every server-observed variant carries an [`ApiFailure`] with the status,
//! raw payload and request id. Use the accessors rather than matching on
//! message text.
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_client::rest::ResourceError;
//!
//! match client.upload_filters().create(&body).await {
//!     Ok(filter) => println!("Created {}", filter["id"]),
//!     Err(ResourceError::ValidationFailed { errors, .. }) => {
//!         for (field, messages) in &errors {
//!             println!("{field}: {}", messages.join(", "));
//!         }
//!     }
//!     Err(e) if e.is_transient() => println!("Try again later: {e}"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::clients::{HttpError, HttpResponseError, RestError};
use crate::config::secs_to_duration;
use crate::rest::query::QueryError;

/// Error codes that mark a `422` as a conflict with the current state.
pub const CONFLICT_CODES: &[&str] = &[
    "STALE_ITEM_VERSION",
    "DELETE_RESTRICTION",
    "ITEM_LOCKED",
    "CONFLICT",
];

/// Diagnostics attached to every server-observed failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    /// HTTP status code.
    pub status: u16,
    /// First error code found in the body, e.g. `INVALID_FIELD`.
    pub code: Option<String>,
    /// The raw response body.
    pub payload: Value,
    /// The `X-Request-Id` of the response.
    pub request_id: Option<String>,
    /// Server retry hint in seconds.
    pub retry_after: Option<f64>,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, ", request id {request_id}")?;
        }
        Ok(())
    }
}

impl From<&HttpResponseError> for ApiFailure {
    fn from(error: &HttpResponseError) -> Self {
        Self {
            status: error.code,
            code: error_code(&error.body),
            payload: error.body.clone(),
            request_id: error.error_reference.clone(),
            retry_after: error.retry_after,
        }
    }
}

/// Error type for resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The query failed validation; no request was sent.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The resource does not declare the operation; no request was sent.
    #[error("{resource} does not support {operation}")]
    UnsupportedOperation {
        /// The resource name.
        resource: &'static str,
        /// The operation name.
        operation: &'static str,
    },

    /// No path for the operation could be filled with the given ids.
    #[error("Cannot resolve path for {resource}::{operation} with provided IDs")]
    PathResolutionFailed {
        /// The resource name.
        resource: &'static str,
        /// The operation name.
        operation: &'static str,
    },

    /// A request body could not be turned into a JSON:API document.
    #[error("Invalid {resource} payload: {reason}")]
    InvalidPayload {
        /// The resource name.
        resource: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A response could not be decoded into the requested type.
    #[error("Failed to decode {resource} response: {message}")]
    Decode {
        /// The resource name.
        resource: &'static str,
        /// The decoder's message.
        message: String,
    },

    /// Missing or invalid credentials (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(ApiFailure),

    /// The token lacks permission (403).
    #[error("Forbidden: {0}")]
    Forbidden(ApiFailure),

    /// The record does not exist (404).
    #[error("{resource} with id {} not found", id.as_deref().unwrap_or("unknown"))]
    NotFound {
        /// The resource name.
        resource: &'static str,
        /// The requested id, when the call targeted one.
        id: Option<String>,
        /// Diagnostics.
        failure: ApiFailure,
    },

    /// The server rejected the payload (422).
    #[error("Validation failed: {errors:?}")]
    ValidationFailed {
        /// Messages per field; errors without a field are under `base`.
        errors: HashMap<String, Vec<String>>,
        /// Diagnostics.
        failure: ApiFailure,
    },

    /// The request conflicts with the record's current state.
    #[error("Conflict: {0}")]
    Conflict(ApiFailure),

    /// A 429 reached the caller without being retried.
    #[error("Rate limited: {0}")]
    RateLimited(ApiFailure),

    /// Rate limiting persisted through every allowed retry.
    #[error("Rate limit still exceeded after {tries} consecutive attempts")]
    RateLimitExceeded {
        /// Consecutive 429 responses received.
        tries: u32,
        /// The last retry hint, in seconds.
        retry_after: Option<f64>,
        /// The last `X-Request-Id`.
        request_id: Option<String>,
    },

    /// The server failed (5xx) after retries.
    #[error("Server error: {0}")]
    ServerError(ApiFailure),

    /// Any other non-success status.
    #[error("Unexpected response: {0}")]
    Unknown(ApiFailure),

    /// An asynchronous job finished unsuccessfully.
    #[error("Job failed: {reason}")]
    JobFailed {
        /// The job's reported reason.
        reason: String,
        /// The job result payload.
        payload: Value,
    },

    /// An asynchronous job did not finish in time.
    #[error("Job {job_id} did not finish within {elapsed:?}")]
    JobTimeout {
        /// The job id.
        job_id: String,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The caller cancelled the operation.
    #[error("Operation was cancelled")]
    Cancelled,

    /// Network or request construction failure.
    #[error(transparent)]
    Http(HttpError),

    /// The path-level client rejected the path.
    #[error("Invalid REST API path: {path}")]
    InvalidPath {
        /// The rejected path.
        path: String,
    },
}

// Verify ResourceError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceError>();
};

impl ResourceError {
    /// Classifies a final error response.
    ///
    /// `resource` and `id` are attached to [`ResourceError::NotFound`].
    #[must_use]
    pub fn from_http_response(
        error: &HttpResponseError,
        resource: &'static str,
        id: Option<&str>,
    ) -> Self {
        let failure = ApiFailure::from(error);
        let is_conflict_code = failure
            .code
            .as_deref()
            .is_some_and(|code| CONFLICT_CODES.contains(&code));

        match error.code {
            401 => Self::Unauthorized(failure),
            403 => Self::Forbidden(failure),
            404 => Self::NotFound {
                resource,
                id: id.map(ToString::to_string),
                failure,
            },
            409 => Self::Conflict(failure),
            422 if is_conflict_code => Self::Conflict(failure),
            400 | 422 => Self::ValidationFailed {
                errors: parse_validation_errors(&error.body),
                failure,
            },
            429 => Self::RateLimited(failure),
            500..=599 => Self::ServerError(failure),
            _ => Self::Unknown(failure),
        }
    }

    /// Classifies a transport error.
    #[must_use]
    pub fn from_http_error(error: HttpError, resource: &'static str, id: Option<&str>) -> Self {
        match error {
            HttpError::Response(response) => Self::from_http_response(&response, resource, id),
            HttpError::RateLimitExceeded(e) => Self::RateLimitExceeded {
                tries: e.tries,
                retry_after: e.retry_after,
                request_id: e.error_reference,
            },
            HttpError::Cancelled => Self::Cancelled,
            other => Self::Http(other),
        }
    }

    /// Classifies a path-level client error.
    #[must_use]
    pub fn from_rest_error(error: RestError, resource: &'static str, id: Option<&str>) -> Self {
        match error {
            RestError::InvalidPath { path } => Self::InvalidPath { path },
            RestError::Http(e) => Self::from_http_error(e, resource, id),
        }
    }

    fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Unauthorized(f)
            | Self::Forbidden(f)
            | Self::Conflict(f)
            | Self::RateLimited(f)
            | Self::ServerError(f)
            | Self::Unknown(f)
            | Self::NotFound { failure: f, .. }
            | Self::ValidationFailed { failure: f, .. } => Some(f),
            _ => None,
        }
    }

    /// Returns the HTTP status, for server-observed failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimitExceeded { .. } => Some(429),
            other => other.failure().map(|f| f.status),
        }
    }

    /// Returns the raw error payload.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::JobFailed { payload, .. } => Some(payload),
            other => other.failure().map(|f| &f.payload),
        }
    }

    /// Returns the error code from the body, e.g. `INVALID_FIELD`.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.failure().and_then(|f| f.code.as_deref())
    }

    /// Returns the request id for error reporting.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::RateLimitExceeded { request_id, .. } => request_id.as_deref(),
            other => other.failure().and_then(|f| f.request_id.as_deref()),
        }
    }

    /// Returns field-level validation messages.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&HashMap<String, Vec<String>>> {
        match self {
            Self::ValidationFailed { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Returns the server's retry hint.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        let secs = match self {
            Self::RateLimitExceeded { retry_after, .. } => *retry_after,
            other => other.failure().and_then(|f| f.retry_after),
        };
        secs.filter(|s| !s.is_nan() && *s >= 0.0)
            .map(secs_to_duration)
    }

    /// Returns `true` for failures worth retrying later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::RateLimitExceeded { .. } | Self::ServerError(_) => true,
            Self::Http(HttpError::Network(e)) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<HttpError> for ResourceError {
    fn from(error: HttpError) -> Self {
        Self::from_http_error(error, "resource", None)
    }
}

impl From<RestError> for ResourceError {
    fn from(error: RestError) -> Self {
        Self::from_rest_error(error, "resource", None)
    }
}

/// Returns the error objects of a body: `errors`, or `data` when it is a
/// list of `api_error` records.
fn error_objects(body: &Value) -> Vec<&Value> {
    if let Some(Value::Array(errors)) = body.get("errors") {
        return errors.iter().collect();
    }
    if let Some(Value::Array(data)) = body.get("data") {
        return data
            .iter()
            .filter(|d| d.get("type").and_then(Value::as_str) == Some("api_error"))
            .collect();
    }
    Vec::new()
}

/// Extracts the first error code from a body.
fn error_code(body: &Value) -> Option<String> {
    error_objects(body).into_iter().find_map(|obj| {
        obj.get("code")
            .or_else(|| obj.pointer("/attributes/code"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    })
}

/// Parses field-level validation messages from an error body.
///
/// Supports JSON:API error objects (`source.pointer`), error records whose
/// `attributes.details.field` names the field, and the plain formats
/// `{"errors": {"field": ["msg"]}}`, `{"errors": ["msg"]}` and
/// `{"errors": "msg"}`. Messages without a field go under `base`.
fn parse_validation_errors(body: &Value) -> HashMap<String, Vec<String>> {
    let mut result: HashMap<String, Vec<String>> = HashMap::new();

    match body.get("errors") {
        Some(Value::Object(map)) => {
            for (field, messages) in map {
                let msgs: Vec<String> = match messages {
                    Value::Array(arr) => arr
                        .iter()
                        .filter_map(|v| v.as_str().map(ToString::to_string))
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => vec![messages.to_string()],
                };
                result.insert(field.clone(), msgs);
            }
            return result;
        }
        Some(Value::String(s)) => {
            result.insert("base".to_string(), vec![s.clone()]);
            return result;
        }
        _ => {}
    }

    if let Some(Value::Array(arr)) = body.get("errors") {
        for message in arr.iter().filter_map(Value::as_str) {
            result
                .entry("base".to_string())
                .or_default()
                .push(message.to_string());
        }
    }

    for obj in error_objects(body).into_iter().filter(|o| o.is_object()) {
        let (field, message) = field_error(obj);
        result.entry(field).or_default().push(message);
    }

    result
}

fn field_error(obj: &Value) -> (String, String) {
    let field = obj
        .pointer("/source/pointer")
        .and_then(Value::as_str)
        .and_then(|pointer| pointer.rsplit('/').find(|segment| !segment.is_empty()))
        .or_else(|| obj.pointer("/source/parameter").and_then(Value::as_str))
        .or_else(|| obj.pointer("/attributes/details/field").and_then(Value::as_str))
        .unwrap_or("base")
        .to_string();

    let message = [
        "/detail",
        "/title",
        "/attributes/details/message",
        "/attributes/details/code",
        "/attributes/code",
        "/code",
    ]
    .iter()
    .find_map(|pointer| obj.pointer(pointer).and_then(Value::as_str))
    .map_or_else(|| obj.to_string(), ToString::to_string);

    (field, message)
}
