//! HTTP response types.
//!
//! This module provides the [`HttpResponse`] type and [`RateLimitInfo`],
//! parsed from the `X-RateLimit-*` headers the API sends on every response.

use std::collections::HashMap;

/// Rate limit information parsed from response headers.
///
/// | Header | Field |
/// |---|---|
/// | `X-RateLimit-Limit` | `limit` |
/// | `X-RateLimit-Remaining` | `remaining` |
/// | `X-RateLimit-Reset` | `reset_after` (seconds) |
///
/// # Example
///
/// ```rust
/// use cms_client::clients::RateLimitInfo;
/// use std::collections::HashMap;
///
/// let mut headers = HashMap::new();
/// headers.insert("x-ratelimit-limit".to_string(), vec!["60".to_string()]);
/// headers.insert("x-ratelimit-remaining".to_string(), vec!["12".to_string()]);
/// headers.insert("x-ratelimit-reset".to_string(), vec!["3".to_string()]);
///
/// let info = RateLimitInfo::from_headers(&headers).unwrap();
/// assert_eq!(info.limit, Some(60));
/// assert_eq!(info.remaining, Some(12));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimitInfo {
    /// Requests allowed in the current window.
    pub limit: Option<u32>,
    /// Requests left in the current window.
    pub remaining: Option<u32>,
    /// Seconds until the window resets.
    pub reset_after: Option<f64>,
}

impl RateLimitInfo {
    /// Parses rate limit headers, returning `None` when none are present.
    #[must_use]
    pub fn from_headers(headers: &HashMap<String, Vec<String>>) -> Option<Self> {
        let first = |name: &str| {
            headers
                .get(name)
                .and_then(|values| values.first())
                .map(|v| v.trim().to_string())
        };

        let limit = first("x-ratelimit-limit").and_then(|v| v.parse().ok());
        let remaining = first("x-ratelimit-remaining").and_then(|v| v.parse().ok());
        let reset_after = first("x-ratelimit-reset")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0);

        if limit.is_none() && remaining.is_none() && reset_after.is_none() {
            return None;
        }

        Some(Self {
            limit,
            remaining,
            reset_after,
        })
    }
}

/// An HTTP response from the API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, lowercased (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body (`{}` when empty).
    pub body: serde_json::Value,
    /// Rate limit information, if the server sent any.
    pub rate_limit: Option<RateLimitInfo>,
    /// Seconds to wait before retrying (`Retry-After`, else `X-RateLimit-Reset`).
    pub retry_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing rate limit headers.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let rate_limit = RateLimitInfo::from_headers(&headers);

        let retry_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .or_else(|| rate_limit.and_then(|info| info.reset_after));

        Self {
            code,
            headers,
            body,
            rate_limit,
            retry_after,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}
