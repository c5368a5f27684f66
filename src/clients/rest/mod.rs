//! Path-level REST client.
//!
//! [`RestClient`] sits on top of [`HttpClient`](crate::clients::HttpClient)
//! and offers `get`/`post`/`put`/`delete` over relative API paths. It is also
//! the entry point for the typed resource layer in [`crate::rest`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_client::{ApiToken, ClientConfig, RestClient};
//!
//! let config = ClientConfig::builder()
//!     .api_token(ApiToken::new("token").unwrap())
//!     .build()
//!     .unwrap();
//! let client = RestClient::new(&config)?;
//!
//! let response = client.get("site", None).await?;
//! println!("Site: {}", response.body);
//! ```
//!
//! # Path Normalization
//!
//! Leading slashes are stripped (`/uploads` -> `uploads`); a path that is
//! empty afterwards is rejected with [`RestError::InvalidPath`].

mod client;
mod errors;

pub use client::RestClient;
pub use errors::RestError;
