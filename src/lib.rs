//! # CMS REST Client
//!
//! An async client for the REST API of a hosted, headless content management
//! system: uploads, records, models, fields, webhooks, environments and the
//! rest of the JSON:API resource collection.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Validated newtypes for the API token, endpoint and environment
//! - An async HTTP transport with rate-limit aware retries, exponential
//!   backoff for server errors and cooperative cancellation
//! - Query encoding for filters, ordering and pagination, validated before any
//!   request is made
//! - One generic [`rest::Resource`] handle serving every resource, with simple
//!   and raw views of each response
//! - Lazy pagination as a [`Stream`](futures::Stream)
//! - A closed error taxonomy ([`rest::ResourceError`]) with structured access to
//!   status, field errors and retry hints
//! - Waiting on asynchronous jobs
//!
//! ## Quick Start
//!
//! ```rust
//! use cms_client::{ApiToken, ClientConfig, EnvironmentName, RestClient};
//!
//! let config = ClientConfig::builder()
//!     .api_token(ApiToken::new("your-api-token").unwrap())
//!     .environment(EnvironmentName::new("staging").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let client = RestClient::new(&config).unwrap();
//! ```
//!
//! ## Listing Records
//!
//! ```rust,ignore
//! use cms_client::rest::{FilterOperator, FilterSpec, ListParams, OrderSpec, PageSpec};
//!
//! let params = ListParams::new()
//!     .filter(FilterSpec::new().field("type", FilterOperator::Eq, "image"))
//!     .order(OrderSpec::parse("-created_at")?)
//!     .page(PageSpec::offset(0, 50));
//!
//! let page = client.uploads().list_page(&params).await?;
//! for upload in page.iter() {
//!     println!("{}", upload["filename"]);
//! }
//! if let Some(next) = page.next_page() {
//!     let more = client.uploads().list_page(&params.clone().page(next)).await?;
//! }
//! ```
//!
//! ## Handling Errors
//!
//! ```rust,ignore
//! use cms_client::rest::ResourceError;
//!
//! match client.upload_filters().create(&serde_json::json!({"name": ""})).await {
//!     Ok(filter) => println!("Created {}", filter["id"]),
//!     Err(ResourceError::ValidationFailed { errors, .. }) => {
//!         println!("Rejected: {errors:?}");
//!     }
//!     Err(e) => println!("Failed (request {:?}): {e}", e.request_id()),
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration and rate-limit state are instances
//!   passed explicitly
//! - **Fail-fast validation**: newtypes and queries validate on construction
//! - **Thread-safe**: all public types are `Send + Sync`
//! - **Async-first**: designed for the Tokio runtime

pub mod clients;
pub mod config;
pub mod error;
pub mod rest;

// Re-export public types at crate root for convenience
pub use config::{
    ApiToken, BaseUrl, ClientConfig, ClientConfigBuilder, EnvironmentName, JobPollPolicy,
    RetryPolicy,
};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError, RateLimitExceededError, RateLimitInfo,
    RateLimitSnapshot, RateLimitState, RestClient, RestError,
};

// Re-export the resource layer's most used types
pub use rest::{
    Envelope, FilterOperator, FilterSpec, JobHandle, ListParams, OrderSpec, Page, PageSpec,
    Resource, ResourceError, ResponseMode,
};
