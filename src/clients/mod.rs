//! HTTP transport for CMS API communication.
//!
//! This module provides the layer that talks to the network: request and
//! response types, retry handling, rate limit bookkeeping and the path-level
//! [`RestClient`].
//!
//! # Overview
//!
//! - [`HttpClient`]: The async HTTP client with retry handling
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`RateLimitState`]: Quota shared between clients using the same token
//! - [`rest::RestClient`]: Path-level REST client
//!
//! # Retry Behavior
//!
//! - **429**: Sleeps for `Retry-After` (or `X-RateLimit-Reset`, or the policy
//!   default), capped by the policy, and retries. The request fails with
//!   [`HttpError::RateLimitExceeded`] after too many consecutive 429s.
//! - **500, 502, 503, 504**: Retried with exponential backoff and jitter.
//! - **Everything else**: Returned immediately as [`HttpError::Response`].
//!
//! See [`RetryPolicy`](crate::RetryPolicy) for the knobs.

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod rate_limit;
pub mod rest;

pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError, RateLimitExceededError};
pub use http_client::{HttpClient, CLIENT_VERSION};
pub(crate) use http_client::sleep_or_cancel;
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{HttpResponse, RateLimitInfo};
pub use rate_limit::{RateLimitSnapshot, RateLimitState};

pub use rest::{RestClient, RestError};
