//! Configuration types for the CMS client.
//!
//! # Overview
//!
//! - [`ClientConfig`]: All settings needed to talk to the API
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`ApiToken`]: A validated access token with masked debug output
//! - [`BaseUrl`]: A validated API endpoint
//! - [`EnvironmentName`]: A validated sandbox environment name
//! - [`RetryPolicy`] and [`JobPollPolicy`]: Transient-failure and job polling behavior
//!
//! # Example
//!
//! ```rust
//! use cms_client::{ClientConfig, ApiToken, EnvironmentName};
//!
//! let config = ClientConfig::builder()
//!     .api_token(ApiToken::new("my-token").unwrap())
//!     .environment(EnvironmentName::new("staging").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.environment().map(AsRef::as_ref), Some("staging"));
//! ```

mod newtypes;
mod policy;

pub use newtypes::{ApiToken, BaseUrl, EnvironmentName};
pub use policy::{JobPollPolicy, RetryPolicy};
pub(crate) use policy::secs_to_duration;

use std::time::Duration;

use crate::error::ConfigError;

/// Default value of the `X-Api-Version` header.
pub const DEFAULT_API_VERSION: &str = "3";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the CMS client.
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`; one instance is usually
/// shared by every client created for the same project.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_token: ApiToken,
    base_url: BaseUrl,
    environment: Option<EnvironmentName>,
    api_version: String,
    user_agent_prefix: Option<String>,
    request_timeout: Duration,
    retry_policy: RetryPolicy,
    job_poll_policy: JobPollPolicy,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API token.
    #[must_use]
    pub const fn api_token(&self) -> &ApiToken {
        &self.api_token
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the sandbox environment, if one is configured.
    #[must_use]
    pub const fn environment(&self) -> Option<&EnvironmentName> {
        self.environment.as_ref()
    }

    /// Returns the value sent in the `X-Api-Version` header.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the job polling policy.
    #[must_use]
    pub const fn job_poll_policy(&self) -> &JobPollPolicy {
        &self.job_poll_policy
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// Only `api_token` is required.
///
/// # Defaults
///
/// - `base_url`: [`BaseUrl::DEFAULT`]
/// - `environment`: `None` (primary environment)
/// - `api_version`: [`DEFAULT_API_VERSION`]
/// - `request_timeout`: 30 seconds
/// - `retry_policy`: [`RetryPolicy::default`]
/// - `job_poll_policy`: [`JobPollPolicy::default`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_token: Option<ApiToken>,
    base_url: Option<BaseUrl>,
    environment: Option<EnvironmentName>,
    api_version: Option<String>,
    user_agent_prefix: Option<String>,
    request_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    job_poll_policy: Option<JobPollPolicy>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API token (required).
    #[must_use]
    pub fn api_token(mut self, token: ApiToken) -> Self {
        self.api_token = Some(token);
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Scopes every request to a sandbox environment.
    #[must_use]
    pub fn environment(mut self, environment: EnvironmentName) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Overrides the `X-Api-Version` header value.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets the job polling policy.
    #[must_use]
    pub fn job_poll_policy(mut self, policy: JobPollPolicy) -> Self {
        self.job_poll_policy = Some(policy);
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_token` is not set
    /// and [`ConfigError::InvalidRetryPolicy`] if the retry or job polling policy
    /// is invalid.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let api_token = self
            .api_token
            .ok_or(ConfigError::MissingRequiredField { field: "api_token" })?;

        let retry_policy = self.retry_policy.unwrap_or_default();
        retry_policy.validate()?;
        let job_poll_policy = self.job_poll_policy.unwrap_or_default();
        job_poll_policy.validate()?;

        Ok(ClientConfig {
            api_token,
            base_url: self.base_url.unwrap_or_default(),
            environment: self.environment,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            user_agent_prefix: self.user_agent_prefix,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            retry_policy,
            job_poll_policy,
        })
    }
}
