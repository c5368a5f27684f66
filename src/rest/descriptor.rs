//! Static resource definitions.
//!
//! A [`ResourceDescriptor`] is plain data: the JSON:API type, the path table
//! and the few knobs in which resources differ (page sizes, pagination style,
//! how list queries are sent). One generic [`Resource`](crate::rest::Resource)
//! handle serves every descriptor.

use crate::rest::path::{get_path, ResourceOperation, ResourcePath};

/// How a resource pages through its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// `page[offset]` / `page[limit]`, with `meta.total_count`.
    Offset,
    /// Opaque `next_token` cursors.
    Cursor,
}

/// How list parameters travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEncoding {
    /// As query-string parameters on a `GET`.
    Query,
    /// As a JSON:API body on a `POST` to the resource's query path.
    Body,
}

/// Static definition of a resource type.
///
/// # Example
///
/// ```rust
/// use cms_client::rest::{ResourceDescriptor, ResourceOperation, ResourcePath};
/// use cms_client::HttpMethod;
///
/// const PATHS: &[ResourcePath] = &[
///     ResourcePath::new(HttpMethod::Get, ResourceOperation::List, &[], "menu-items"),
///     ResourcePath::new(HttpMethod::Get, ResourceOperation::Find, &["id"], "menu-items/{id}"),
/// ];
///
/// const MENU_ITEMS: ResourceDescriptor =
///     ResourceDescriptor::new("MenuItem", "menu_item", "menu_items", PATHS)
///         .with_page_limits(30, 100);
///
/// assert!(MENU_ITEMS.supports(ResourceOperation::Find));
/// assert!(!MENU_ITEMS.supports(ResourceOperation::Destroy));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Human-readable name used in errors.
    pub name: &'static str,
    /// JSON:API type of the records.
    pub entity_type: &'static str,
    /// Relationship key under which bulk operations list their targets.
    pub collection: &'static str,
    /// Path table.
    pub paths: &'static [ResourcePath],
    /// Page size used when the caller does not pick one.
    pub default_page_limit: u32,
    /// Largest page size the server accepts.
    pub max_page_limit: u32,
    /// Pagination style.
    pub pagination: PaginationStyle,
    /// List parameter encoding.
    pub list_encoding: ListEncoding,
    /// JSON:API type of body-encoded query documents.
    pub query_type: Option<&'static str>,
    /// JSON:API type of bulk destroy documents.
    pub bulk_destroy_type: Option<&'static str>,
    /// Attribute name to related JSON:API type.
    pub relationships: &'static [(&'static str, &'static str)],
}

impl ResourceDescriptor {
    /// Creates a descriptor with offset pagination and query-string lists.
    #[must_use]
    pub const fn new(
        name: &'static str,
        entity_type: &'static str,
        collection: &'static str,
        paths: &'static [ResourcePath],
    ) -> Self {
        Self {
            name,
            entity_type,
            collection,
            paths,
            default_page_limit: 30,
            max_page_limit: 100,
            pagination: PaginationStyle::Offset,
            list_encoding: ListEncoding::Query,
            query_type: None,
            bulk_destroy_type: None,
            relationships: &[],
        }
    }

    /// Sets the default and maximum page size.
    #[must_use]
    pub const fn with_page_limits(self, default_page_limit: u32, max_page_limit: u32) -> Self {
        Self {
            default_page_limit,
            max_page_limit,
            ..self
        }
    }

    /// Switches to cursor pagination.
    #[must_use]
    pub const fn with_cursor_pagination(self) -> Self {
        Self {
            pagination: PaginationStyle::Cursor,
            ..self
        }
    }

    /// Sends list parameters as a body of the given JSON:API type.
    #[must_use]
    pub const fn with_body_queries(self, query_type: &'static str) -> Self {
        Self {
            list_encoding: ListEncoding::Body,
            query_type: Some(query_type),
            ..self
        }
    }

    /// Sets the JSON:API type of bulk destroy documents.
    #[must_use]
    pub const fn with_bulk_destroy(self, bulk_destroy_type: &'static str) -> Self {
        Self {
            bulk_destroy_type: Some(bulk_destroy_type),
            ..self
        }
    }

    /// Sets the relationship table.
    #[must_use]
    pub const fn with_relationships(
        self,
        relationships: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            relationships,
            ..self
        }
    }

    /// Returns `true` if any path serves `operation`.
    #[must_use]
    pub fn supports(&self, operation: ResourceOperation) -> bool {
        self.paths.iter().any(|p| p.operation == operation)
    }

    /// Returns the operation that actually serves a list call.
    #[must_use]
    pub const fn list_operation(&self) -> ResourceOperation {
        match self.list_encoding {
            ListEncoding::Query => ResourceOperation::List,
            ListEncoding::Body => ResourceOperation::Query,
        }
    }

    /// Selects the path for `operation` given the available ids.
    #[must_use]
    pub fn path_for(
        &self,
        operation: ResourceOperation,
        available_ids: &[&str],
    ) -> Option<&'static ResourcePath> {
        get_path(self.paths, operation, available_ids)
    }

    /// Returns the related type for a relationship attribute.
    #[must_use]
    pub fn relationship_type(&self, attribute: &str) -> Option<&'static str> {
        self.relationships
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, related)| *related)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpMethod;

    const PATHS: &[ResourcePath] = &[
        ResourcePath::new(
            HttpMethod::Post,
            ResourceOperation::Query,
            &[],
            "audit-log-events/query",
        ),
    ];

    #[test]
    fn test_builders_override_defaults() {
        const AUDIT: ResourceDescriptor =
            ResourceDescriptor::new("AuditLogEvent", "audit_log_event", "audit_log_events", PATHS)
                .with_page_limits(50, 500)
                .with_cursor_pagination()
                .with_body_queries("audit_log_query");

        assert_eq!(AUDIT.default_page_limit, 50);
        assert_eq!(AUDIT.max_page_limit, 500);
        assert_eq!(AUDIT.pagination, PaginationStyle::Cursor);
        assert_eq!(AUDIT.list_encoding, ListEncoding::Body);
        assert_eq!(AUDIT.query_type, Some("audit_log_query"));
        assert_eq!(AUDIT.list_operation(), ResourceOperation::Query);
    }

    #[test]
    fn test_supports_and_path_for() {
        let descriptor = ResourceDescriptor::new("X", "x", "xs", PATHS);
        assert!(descriptor.supports(ResourceOperation::Query));
        assert!(!descriptor.supports(ResourceOperation::Find));
        assert!(descriptor.path_for(ResourceOperation::Query, &[]).is_some());
        assert_eq!(descriptor.list_operation(), ResourceOperation::List);
    }

    #[test]
    fn test_relationship_lookup() {
        let descriptor = ResourceDescriptor::new("Item", "item", "items", PATHS)
            .with_relationships(&[("item_type", "item_type"), ("creator", "account")]);
        assert_eq!(descriptor.relationship_type("creator"), Some("account"));
        assert_eq!(descriptor.relationship_type("title"), None);
    }
}
