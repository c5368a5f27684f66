//! REST client implementation.
//!
//! This module provides the [`RestClient`] type for making requests against
//! relative API paths, with path normalization and the transport's retry
//! handling.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clients::rate_limit::{RateLimitSnapshot, RateLimitState};
use crate::clients::rest::RestError;
use crate::clients::{DataType, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::config::ClientConfig;

/// Query parameters as ordered key/value pairs.
pub type QueryPairs = Vec<(String, String)>;

/// Path-level REST client.
///
/// Cloning is cheap: clones share the underlying connection pool and rate
/// limit state.
///
/// # Example
///
/// ```rust,ignore
/// use cms_client::RestClient;
/// use serde_json::json;
///
/// let client = RestClient::new(&config)?;
///
/// let response = client
///     .post(
///         "upload-filters",
///         json!({"data": {"type": "upload_filter", "attributes": {"name": "Images"}}}),
///         None,
///     )
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct RestClient {
    http_client: Arc<HttpClient>,
    config: ClientConfig,
}

// Verify RestClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestClient>();
};

impl RestClient {
    /// Creates a new client with its own rate limit state.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Http`] if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, RestError> {
        Self::with_rate_limits(config, RateLimitState::shared())
    }

    /// Creates a new client that records quota into `rate_limits`.
    ///
    /// Clients created with the same state observe each other's quota.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Http`] if the HTTP client cannot be created.
    pub fn with_rate_limits(
        config: &ClientConfig,
        rate_limits: Arc<RateLimitState>,
    ) -> Result<Self, RestError> {
        let http_client = HttpClient::new(config, rate_limits)?;
        tracing::debug!(
            base_url = %config.base_url().as_ref(),
            environment = ?config.environment().map(AsRef::as_ref),
            "Created REST client"
        );

        Ok(Self {
            http_client: Arc::new(http_client),
            config: config.clone(),
        })
    }

    /// Returns the configuration this client was built from.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// Returns the last quota reported for this client's token.
    #[must_use]
    pub fn rate_limit_snapshot(&self) -> Option<RateLimitSnapshot> {
        self.http_client
            .rate_limits()
            .snapshot(self.http_client.api_token())
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] for an empty path and
    /// [`RestError::Http`] for transport failures.
    pub async fn get(
        &self,
        path: &str,
        query: Option<QueryPairs>,
    ) -> Result<HttpResponse, RestError> {
        self.send(HttpMethod::Get, path, None, query.unwrap_or_default(), None)
            .await
    }

    /// Sends a POST request with a JSON:API body.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] for an empty path and
    /// [`RestError::Http`] for transport failures.
    pub async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        query: Option<QueryPairs>,
    ) -> Result<HttpResponse, RestError> {
        self.send(
            HttpMethod::Post,
            path,
            Some(body),
            query.unwrap_or_default(),
            None,
        )
        .await
    }

    /// Sends a PUT request with a JSON:API body.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] for an empty path and
    /// [`RestError::Http`] for transport failures.
    pub async fn put(
        &self,
        path: &str,
        body: serde_json::Value,
        query: Option<QueryPairs>,
    ) -> Result<HttpResponse, RestError> {
        self.send(
            HttpMethod::Put,
            path,
            Some(body),
            query.unwrap_or_default(),
            None,
        )
        .await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] for an empty path and
    /// [`RestError::Http`] for transport failures.
    pub async fn delete(
        &self,
        path: &str,
        query: Option<QueryPairs>,
    ) -> Result<HttpResponse, RestError> {
        self.send(HttpMethod::Delete, path, None, query.unwrap_or_default(), None)
            .await
    }

    /// Sends a request with every knob exposed.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidPath`] for an empty path and
    /// [`RestError::Http`] for transport failures, including
    /// [`HttpError::Cancelled`](crate::clients::HttpError::Cancelled) when
    /// `cancellation` fires.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<serde_json::Value>,
        query: QueryPairs,
        cancellation: Option<CancellationToken>,
    ) -> Result<HttpResponse, RestError> {
        let normalized_path = normalize_path(path)?;

        let mut builder = HttpRequest::builder(method, normalized_path)
            .query(query)
            .cancellation(cancellation);
        if let Some(body_value) = body {
            builder = builder.body(body_value).body_type(DataType::JsonApi);
        }

        let request = builder.build().map_err(|e| RestError::Http(e.into()))?;

        self.http_client.request(request).await.map_err(Into::into)
    }
}

/// Strips leading slashes, rejecting paths that end up empty.
fn normalize_path(path: &str) -> Result<String, RestError> {
    let trimmed = path.trim_start_matches('/');

    if trimmed.is_empty() {
        return Err(RestError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiToken;

    fn test_config() -> ClientConfig {
        ClientConfig::builder()
            .api_token(ApiToken::new("test-token").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_normalize_path_strips_leading_slash() {
        assert_eq!(normalize_path("/uploads").unwrap(), "uploads");
        assert_eq!(normalize_path("//uploads").unwrap(), "uploads");
    }

    #[test]
    fn test_normalize_path_keeps_nested_segments() {
        assert_eq!(
            normalize_path("/webhook_calls/12/resend_webhook").unwrap(),
            "webhook_calls/12/resend_webhook"
        );
    }

    #[test]
    fn test_normalize_path_empty_path_returns_error() {
        assert!(matches!(
            normalize_path(""),
            Err(RestError::InvalidPath { path }) if path.is_empty()
        ));
        assert!(matches!(
            normalize_path("/"),
            Err(RestError::InvalidPath { path }) if path == "/"
        ));
    }

    #[test]
    fn test_clones_share_rate_limit_state() {
        let client = RestClient::new(&test_config()).unwrap();
        let clone = client.clone();

        assert!(Arc::ptr_eq(
            client.http_client().rate_limits(),
            clone.http_client().rate_limits()
        ));
        assert!(client.rate_limit_snapshot().is_none());
    }

    #[test]
    fn test_injected_rate_limit_state_is_used() {
        let state = RateLimitState::shared();
        let first = RestClient::with_rate_limits(&test_config(), Arc::clone(&state)).unwrap();
        let second = RestClient::with_rate_limits(&test_config(), Arc::clone(&state)).unwrap();

        assert!(Arc::ptr_eq(
            first.http_client().rate_limits(),
            second.http_client().rate_limits()
        ));
    }
}
