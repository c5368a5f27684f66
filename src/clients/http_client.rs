//! HTTP client for CMS API communication.
//!
//! This module provides the [`HttpClient`] type for making authenticated
//! requests with automatic rate limit and server error handling.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clients::errors::{HttpError, HttpResponseError, RateLimitExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::rate_limit::RateLimitState;
use crate::config::{ApiToken, ClientConfig, RetryPolicy};

/// Client version from Cargo.toml.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server error statuses that are retried with backoff.
const RETRYABLE_SERVER_ERRORS: [u16; 4] = [500, 502, 503, 504];

/// HTTP client for making requests to the CMS API.
///
/// The client handles:
/// - Default headers (bearer token, API version, environment, User-Agent)
/// - Consecutive-429 handling using the server's retry hint
/// - Exponential backoff with jitter for 500/502/503/504
/// - Pre-emptive waiting when the shared quota is exhausted
/// - Cooperative cancellation of sends and sleeps
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use cms_client::clients::{HttpClient, HttpRequest, HttpMethod, RateLimitState};
/// use cms_client::{ClientConfig, ApiToken};
///
/// let config = ClientConfig::builder()
///     .api_token(ApiToken::new("token").unwrap())
///     .build()
///     .unwrap();
/// let client = HttpClient::new(&config, RateLimitState::shared())?;
///
/// let request = HttpRequest::builder(HttpMethod::Get, "uploads").build().unwrap();
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
    /// Key into the shared rate limit state.
    token: ApiToken,
    retry_policy: RetryPolicy,
    rate_limits: Arc<RateLimitState>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying reqwest client cannot
    /// be created (for example when TLS initialization fails).
    pub fn new(config: &ClientConfig, rate_limits: Arc<RateLimitState>) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}cms-rest-client v{CLIENT_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        default_headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", config.api_token().as_ref()),
        );
        default_headers.insert(
            "X-Api-Version".to_string(),
            config.api_version().to_string(),
        );
        if let Some(environment) = config.environment() {
            default_headers.insert("X-Environment".to_string(), environment.to_string());
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().as_ref().to_string(),
            default_headers,
            token: config.api_token().clone(),
            retry_policy: config.retry_policy().clone(),
            rate_limits,
        })
    }

    /// Returns the base URL for this client.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the retry policy in effect.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the shared rate limit state.
    #[must_use]
    pub const fn rate_limits(&self) -> &Arc<RateLimitState> {
        &self.rate_limits
    }

    /// Returns the token this client authenticates with.
    #[must_use]
    pub const fn api_token(&self) -> &ApiToken {
        &self.token
    }

    /// Sends an HTTP request to the API.
    ///
    /// This method handles:
    /// - Request validation
    /// - URL construction and header merging
    /// - Response parsing and rate limit bookkeeping
    /// - Retry logic for 429 and retryable 5xx responses
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - A network error occurs (`Network`)
    /// - A final non-2xx response is received (`Response`)
    /// - Too many consecutive 429 responses are received (`RateLimitExceeded`)
    /// - The request's cancellation token fires (`Cancelled`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = format!("{}/{}", self.base_url, request.path);

        let mut headers = self.default_headers.clone();
        if let Some(body_type) = &request.body_type {
            headers.insert(
                "Content-Type".to_string(),
                body_type.as_content_type().to_string(),
            );
        }
        for (key, value) in &request.extra_headers {
            headers.insert(key.clone(), value.clone());
        }

        let cancel = request.cancellation.as_ref();
        let policy = &self.retry_policy;
        let mut attempt: u32 = 0;
        let mut consecutive_rate_limited: u32 = 0;
        let mut server_error_retries: u32 = 0;

        loop {
            if request.is_cancelled() {
                return Err(HttpError::Cancelled);
            }

            if let Some(wait) = self.rate_limits.required_wait(&self.token) {
                let wait = wait.min(policy.max_rate_limit_wait);
                tracing::warn!(
                    path = %request.path,
                    wait_ms = wait.as_millis(),
                    "Rate limit quota exhausted, delaying request until reset"
                );
                sleep_or_cancel(wait, cancel).await?;
            }

            attempt += 1;
            tracing::debug!(
                method = %request.http_method,
                path = %request.path,
                attempt,
                "Sending request"
            );

            let mut req_builder = match request.http_method {
                HttpMethod::Get => self.client.get(&url),
                HttpMethod::Post => self.client.post(&url),
                HttpMethod::Put => self.client.put(&url),
                HttpMethod::Delete => self.client.delete(&url),
            };
            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }
            if !request.query.is_empty() {
                req_builder = req_builder.query(&request.query);
            }
            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.to_string());
            }

            let response = run_or_cancel(cancel, async move {
                let res = req_builder.send().await?;
                let code = res.status().as_u16();
                let res_headers = Self::parse_response_headers(res.headers());
                let body_text = res.text().await.unwrap_or_default();
                Ok::<_, reqwest::Error>(HttpResponse::new(
                    code,
                    res_headers,
                    Self::parse_body(code, &body_text),
                ))
            })
            .await??;

            if let Some(info) = &response.rate_limit {
                self.rate_limits.record(&self.token, info);
            }

            if response.is_ok() {
                return Ok(response);
            }

            let code = response.code;
            let error_message = Self::serialize_error(&response);

            if code == 429 {
                consecutive_rate_limited += 1;
                if policy.max_rate_limit_retries == 0 {
                    return Err(Self::response_error(&response, error_message));
                }
                if consecutive_rate_limited >= policy.max_rate_limit_retries {
                    tracing::warn!(
                        path = %request.path,
                        tries = consecutive_rate_limited,
                        "Giving up after consecutive rate limited responses"
                    );
                    return Err(HttpError::RateLimitExceeded(RateLimitExceededError {
                        tries: consecutive_rate_limited,
                        retry_after: response.retry_after,
                        message: error_message,
                        error_reference: response.request_id().map(String::from),
                    }));
                }

                let delay = policy.rate_limit_delay(response.retry_after);
                tracing::warn!(
                    path = %request.path,
                    consecutive = consecutive_rate_limited,
                    delay_ms = delay.as_millis(),
                    "Rate limited, backing off"
                );
                sleep_or_cancel(delay, cancel).await?;
                continue;
            }

            consecutive_rate_limited = 0;

            if RETRYABLE_SERVER_ERRORS.contains(&code)
                && server_error_retries < policy.server_error_retries
            {
                server_error_retries += 1;
                let delay = policy.server_error_delay(server_error_retries);
                tracing::debug!(
                    path = %request.path,
                    code,
                    retry = server_error_retries,
                    delay_ms = delay.as_millis(),
                    "Server error, retrying with backoff"
                );
                sleep_or_cancel(delay, cancel).await?;
                continue;
            }

            if RETRYABLE_SERVER_ERRORS.contains(&code) {
                tracing::warn!(
                    path = %request.path,
                    code,
                    "Server error retries exhausted"
                );
            }

            return Err(Self::response_error(&response, error_message));
        }
    }

    fn response_error(response: &HttpResponse, message: String) -> HttpError {
        HttpError::Response(HttpResponseError {
            code: response.code,
            message,
            body: response.body.clone(),
            retry_after: response.retry_after,
            error_reference: response.request_id().map(String::from),
        })
    }

    /// Parses a response body, keeping non-JSON server error pages readable.
    fn parse_body(code: u16, body_text: &str) -> serde_json::Value {
        if body_text.is_empty() {
            return serde_json::json!({});
        }
        serde_json::from_str(body_text).unwrap_or_else(|_| {
            if code >= 500 {
                serde_json::json!({ "raw_body": body_text })
            } else {
                serde_json::json!({})
            }
        })
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Serializes an error response to a compact JSON summary.
    fn serialize_error(response: &HttpResponse) -> String {
        let mut error_body = serde_json::Map::new();

        if let Some(errors) = response.body.get("errors") {
            error_body.insert("errors".to_string(), errors.clone());
        }
        if let Some(error) = response.body.get("error") {
            error_body.insert("error".to_string(), error.clone());
        }
        if let Some(raw) = response.body.get("raw_body") {
            error_body.insert("raw_body".to_string(), raw.clone());
        }
        error_body.insert("status".to_string(), serde_json::json!(response.code));

        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::to_string(&error_body).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Sleeps for `duration`, returning early with `Cancelled` if the token fires.
pub(crate) async fn sleep_or_cancel(
    duration: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<(), HttpError> {
    run_or_cancel(cancel, tokio::time::sleep(duration)).await
}

/// Drives `future` to completion unless the token fires first.
pub(crate) async fn run_or_cancel<F: Future>(
    cancel: Option<&CancellationToken>,
    future: F,
) -> Result<F::Output, HttpError> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(HttpError::Cancelled),
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentName;

    fn test_config() -> ClientConfig {
        ClientConfig::builder()
            .api_token(ApiToken::new("test-token").unwrap())
            .build()
            .unwrap()
    }

    fn client_for(config: &ClientConfig) -> HttpClient {
        HttpClient::new(config, RateLimitState::shared()).unwrap()
    }

    #[test]
    fn test_client_uses_default_base_url() {
        let client = client_for(&test_config());
        assert_eq!(client.base_url(), "https://site-api.datocms.com");
    }

    #[test]
    fn test_user_agent_header_format() {
        let client = client_for(&test_config());

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("cms-rest-client v"));
        assert!(user_agent.contains("Rust"));
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let config = ClientConfig::builder()
            .api_token(ApiToken::new("test-token").unwrap())
            .user_agent_prefix("MyApp/1.0")
            .build()
            .unwrap();
        let client = client_for(&config);

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("MyApp/1.0 | "));
    }

    #[test]
    fn test_bearer_token_and_version_headers() {
        let client = client_for(&test_config());

        assert_eq!(
            client.default_headers().get("Authorization"),
            Some(&"Bearer test-token".to_string())
        );
        assert_eq!(
            client.default_headers().get("X-Api-Version"),
            Some(&"3".to_string())
        );
        assert_eq!(
            client.default_headers().get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_environment_header_only_when_configured() {
        let client = client_for(&test_config());
        assert!(client.default_headers().get("X-Environment").is_none());

        let config = ClientConfig::builder()
            .api_token(ApiToken::new("test-token").unwrap())
            .environment(EnvironmentName::new("staging").unwrap())
            .build()
            .unwrap();
        let client = client_for(&config);
        assert_eq!(
            client.default_headers().get("X-Environment"),
            Some(&"staging".to_string())
        );
    }

    #[test]
    fn test_parse_body_keeps_raw_server_error_pages() {
        let body = HttpClient::parse_body(502, "<html>Bad Gateway</html>");
        assert_eq!(body["raw_body"], "<html>Bad Gateway</html>");

        let body = HttpClient::parse_body(404, "not json");
        assert_eq!(body, serde_json::json!({}));

        let body = HttpClient::parse_body(204, "");
        assert_eq!(body, serde_json::json!({}));
    }

    #[test]
    fn test_serialize_error_includes_errors_and_reference() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["req-9".to_string()]);
        let response = HttpResponse::new(
            422,
            headers,
            serde_json::json!({"errors": [{"id": "e1"}]}),
        );

        let message = HttpClient::serialize_error(&response);
        assert!(message.contains("\"errors\""));
        assert!(message.contains("req-9"));
        assert!(message.contains("422"));
    }

    #[tokio::test]
    async fn test_run_or_cancel_returns_cancelled_when_token_fired() {
        let token = CancellationToken::new();
        token.cancel();

        let result = run_or_cancel(Some(&token), std::future::pending::<()>()).await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }

    #[tokio::test]
    async fn test_sleep_without_token_completes() {
        let result = sleep_or_cancel(Duration::from_millis(1), None).await;
        assert!(result.is_ok());
    }
}
