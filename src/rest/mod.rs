//! Resource layer of the content management API.
//!
//! This module turns the path-level [`RestClient`](crate::RestClient) into
//! typed operations on resources:
//!
//! - **[`ResourceDescriptor`]**: static data describing one resource type
//! - **[`Resource<T>`]**: the one generic handle serving every descriptor
//! - **Query encoding**: [`FilterSpec`], [`OrderSpec`], [`PageSpec`] and
//!   [`encode`], validated before any request is made
//! - **[`Envelope`]**: the JSON:API document, with [`normalize`] producing the
//!   simple or raw view
//! - **[`Page<T>`]** and [`Resource::list_all`]: manual and lazy pagination
//! - **[`ResourceError`]**: the closed error taxonomy
//! - **[`JobHandle`]**: asynchronous jobs and waiting on them
//! - **[`TrackedResource<T>`]**: dirty tracking for partial updates
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_client::{ApiToken, ClientConfig, RestClient};
//! use cms_client::rest::{FilterOperator, FilterSpec, ListParams, PageSpec};
//! use futures::TryStreamExt;
//!
//! let config = ClientConfig::builder()
//!     .api_token(ApiToken::new("your-api-token")?)
//!     .build()?;
//! let client = RestClient::new(&config)?;
//!
//! // One page, simple view
//! let params = ListParams::new()
//!     .filter(
//!         FilterSpec::new()
//!             .field("type", FilterOperator::Eq, "image")
//!             .field("size", FilterOperator::Gt, 1_048_576),
//!     )
//!     .page(PageSpec::offset(0, 2));
//! let uploads = client.uploads().list(&params).await?;
//!
//! // The same page with `meta`
//! let envelope = client.uploads().raw_list(&params).await?;
//! println!("{:?} matching uploads", envelope.total_count());
//!
//! // Every matching upload, one page at a time
//! let all: Vec<serde_json::Value> = client
//!     .uploads()
//!     .list_all(ListParams::new())
//!     .try_collect()
//!     .await?;
//! ```

mod descriptor;
mod envelope;
mod errors;
mod jobs;
mod page;
mod paginator;
mod path;
mod query;
mod resource;
mod tracking;

pub mod resources;

pub use descriptor::{ListEncoding, PaginationStyle, ResourceDescriptor};
pub use envelope::{
    normalize, to_document, Entity, Envelope, Meta, Normalized, PrimaryData, Relationship,
    RelationshipData, ResourceIdentifier, ResponseMode,
};
pub use errors::{ApiFailure, ResourceError, CONFLICT_CODES};
pub use jobs::{JobHandle, JobStatus};
pub use page::Page;
pub use path::{build_path, get_path, ResourceOperation, ResourcePath};
pub use query::{
    encode, FieldFilter, FilterEntry, FilterOperator, FilterSpec, ListParams, OrderClause,
    OrderSpec, PageSpec, QueryError, QueryParameters, SortDirection, FILTER_GROUPS,
};
pub use resource::Resource;
pub use tracking::TrackedResource;
