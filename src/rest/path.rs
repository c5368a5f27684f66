//! Path templates for resource operations.
//!
//! Each resource declares a table of [`ResourcePath`]s: one entry per
//! operation and access pattern. Fields, for example, are listed under their
//! item type (`item-types/{item_type_id}/fields`) but fetched directly
//! (`fields/{id}`).
//!
//! [`get_path`] selects the most specific entry whose placeholders can all be
//! filled; [`build_path`] fills them in, percent-encoding every value.
//!
//! # Example
//!
//! ```rust
//! use cms_client::rest::{build_path, get_path, ResourceOperation, ResourcePath};
//! use cms_client::HttpMethod;
//!
//! const PATHS: &[ResourcePath] = &[
//!     ResourcePath::new(
//!         HttpMethod::Get,
//!         ResourceOperation::List,
//!         &["item_type_id"],
//!         "item-types/{item_type_id}/fields",
//!     ),
//!     ResourcePath::new(HttpMethod::Get, ResourceOperation::Find, &["id"], "fields/{id}"),
//! ];
//!
//! let path = get_path(PATHS, ResourceOperation::Find, &["id"]).unwrap();
//! let url = build_path(path.template, &[("id", "42")]).unwrap();
//! assert_eq!(url, "fields/42");
//! ```

use std::fmt;

use crate::clients::HttpMethod;

/// Operations a resource may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceOperation {
    /// List a collection (`GET`, or `POST` for body-encoded queries).
    List,
    /// Fetch one record.
    Find,
    /// Create a record.
    Create,
    /// Update a record.
    Update,
    /// Delete a record.
    Destroy,
    /// Delete many records in one asynchronous job.
    BulkDestroy,
    /// Run a query whose parameters travel in the request body.
    Query,
    /// Re-deliver a record, e.g. a webhook call or an invitation.
    Resend,
}

impl ResourceOperation {
    /// Returns the default HTTP method for this operation.
    #[must_use]
    pub const fn default_http_method(&self) -> HttpMethod {
        match self {
            Self::List | Self::Find => HttpMethod::Get,
            Self::Create | Self::BulkDestroy | Self::Query | Self::Resend => HttpMethod::Post,
            Self::Update => HttpMethod::Put,
            Self::Destroy => HttpMethod::Delete,
        }
    }

    /// Returns the operation name used in errors and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Find => "find",
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
            Self::BulkDestroy => "bulk_destroy",
            Self::Query => "query",
            Self::Resend => "resend",
        }
    }
}

impl fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL template for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePath {
    /// The HTTP method.
    pub http_method: HttpMethod,
    /// The operation served by this path.
    pub operation: ResourceOperation,
    /// Placeholder names that must be supplied.
    pub ids: &'static [&'static str],
    /// The template, relative to the API root.
    pub template: &'static str,
}

impl ResourcePath {
    /// Creates a path entry.
    #[must_use]
    pub const fn new(
        http_method: HttpMethod,
        operation: ResourceOperation,
        ids: &'static [&'static str],
        template: &'static str,
    ) -> Self {
        Self {
            http_method,
            operation,
            ids,
            template,
        }
    }

    /// Returns the number of placeholders.
    #[must_use]
    pub const fn id_count(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if every placeholder is among `available_ids`.
    #[must_use]
    pub fn matches_ids(&self, available_ids: &[&str]) -> bool {
        self.ids.iter().all(|id| available_ids.contains(id))
    }
}

/// Selects the most specific path for `operation` that `available_ids` can fill.
#[must_use]
pub fn get_path<'a>(
    paths: &'a [ResourcePath],
    operation: ResourceOperation,
    available_ids: &[&str],
) -> Option<&'a ResourcePath> {
    paths
        .iter()
        .filter(|p| p.operation == operation)
        .filter(|p| p.matches_ids(available_ids))
        .max_by_key(|p| p.id_count())
}

/// Fills `{name}` placeholders, percent-encoding each value.
///
/// Returns `None` if a placeholder is left unfilled.
#[must_use]
pub fn build_path(template: &str, ids: &[(&str, &str)]) -> Option<String> {
    let mut result = template.to_string();

    for (key, value) in ids {
        let placeholder = format!("{{{key}}}");
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }

    if result.contains('{') {
        return None;
    }
    Some(result)
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceOperation>();
    assert_send_sync::<ResourcePath>();
};
