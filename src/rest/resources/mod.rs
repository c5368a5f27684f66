//! Built-in resource descriptors.
//!
//! Every resource of the content management API is a [`ResourceDescriptor`]
//! in this table. [`RestClient`] has a named accessor for each; any other
//! endpoint can be reached by declaring a descriptor and passing it to
//! [`RestClient::resource`].
//!
//! | Accessor | Operations |
//! |---|---|
//! | [`uploads`](RestClient::uploads) | list, find, create, update, destroy, bulk destroy |
//! | [`upload_filters`](RestClient::upload_filters) | list, find, create, update, destroy |
//! | [`items`](RestClient::items) | list, find, create, update, destroy, bulk destroy |
//! | [`item_types`](RestClient::item_types) | list, find, create, update, destroy |
//! | [`fields`](RestClient::fields) | list and create under an item type; find, update, destroy |
//! | [`audit_log_events`](RestClient::audit_log_events) | query (cursor pagination) |
//! | [`webhooks`](RestClient::webhooks) | list, find, create, update, destroy |
//! | [`webhook_calls`](RestClient::webhook_calls) | list, find, resend |
//! | [`search_results`](RestClient::search_results) | list |
//! | [`environments`](RestClient::environments) | list, find, destroy |
//! | [`site_invitations`](RestClient::site_invitations) | list, find, create, destroy, resend |
//! | [`job_results`](RestClient::job_results) | find |
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_client::rest::{FilterOperator, FilterSpec, ListParams};
//!
//! let fields = client.fields("44").list(&ListParams::new()).await?;
//!
//! let recent = client
//!     .items()
//!     .list(&ListParams::new().filter(FilterSpec::new().field(
//!         "type",
//!         FilterOperator::Eq,
//!         "article",
//!     )))
//!     .await?;
//! ```

use serde_json::Value;

use crate::clients::{HttpMethod, RestClient};
use crate::rest::descriptor::ResourceDescriptor;
use crate::rest::path::{ResourceOperation as Op, ResourcePath};
use crate::rest::resource::Resource;

const fn path(
    method: HttpMethod,
    operation: Op,
    ids: &'static [&'static str],
    template: &'static str,
) -> ResourcePath {
    ResourcePath::new(method, operation, ids, template)
}

const UPLOADS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "uploads"),
    path(HttpMethod::Get, Op::Find, &["id"], "uploads/{id}"),
    path(HttpMethod::Post, Op::Create, &[], "uploads"),
    path(HttpMethod::Put, Op::Update, &["id"], "uploads/{id}"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "uploads/{id}"),
    path(HttpMethod::Post, Op::BulkDestroy, &[], "uploads/bulk/destroy"),
];

/// Media library uploads.
pub static UPLOADS: ResourceDescriptor =
    ResourceDescriptor::new("Upload", "upload", "uploads", UPLOADS_PATHS)
        .with_page_limits(30, 500)
        .with_bulk_destroy("upload_bulk_destroy_operation")
        .with_relationships(&[("upload_collection", "upload_collection")]);

const UPLOAD_FILTERS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "upload-filters"),
    path(HttpMethod::Get, Op::Find, &["id"], "upload-filters/{id}"),
    path(HttpMethod::Post, Op::Create, &[], "upload-filters"),
    path(HttpMethod::Put, Op::Update, &["id"], "upload-filters/{id}"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "upload-filters/{id}"),
];

/// Saved media library searches.
pub static UPLOAD_FILTERS: ResourceDescriptor = ResourceDescriptor::new(
    "UploadFilter",
    "upload_filter",
    "upload_filters",
    UPLOAD_FILTERS_PATHS,
);

const ITEMS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "items"),
    path(HttpMethod::Get, Op::Find, &["id"], "items/{id}"),
    path(HttpMethod::Post, Op::Create, &[], "items"),
    path(HttpMethod::Put, Op::Update, &["id"], "items/{id}"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "items/{id}"),
    path(HttpMethod::Post, Op::BulkDestroy, &[], "items/bulk/destroy"),
];

/// Content records.
pub static ITEMS: ResourceDescriptor =
    ResourceDescriptor::new("Item", "item", "items", ITEMS_PATHS)
        .with_page_limits(30, 500)
        .with_bulk_destroy("item_bulk_destroy_operation")
        .with_relationships(&[("item_type", "item_type")]);

const ITEM_TYPES_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "item-types"),
    path(HttpMethod::Get, Op::Find, &["id"], "item-types/{id}"),
    path(HttpMethod::Post, Op::Create, &[], "item-types"),
    path(HttpMethod::Put, Op::Update, &["id"], "item-types/{id}"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "item-types/{id}"),
];

/// Content models.
pub static ITEM_TYPES: ResourceDescriptor =
    ResourceDescriptor::new("ItemType", "item_type", "item_types", ITEM_TYPES_PATHS);

const FIELDS_PATHS: &[ResourcePath] = &[
    path(
        HttpMethod::Get,
        Op::List,
        &["item_type_id"],
        "item-types/{item_type_id}/fields",
    ),
    path(HttpMethod::Get, Op::Find, &["id"], "fields/{id}"),
    path(
        HttpMethod::Post,
        Op::Create,
        &["item_type_id"],
        "item-types/{item_type_id}/fields",
    ),
    path(HttpMethod::Put, Op::Update, &["id"], "fields/{id}"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "fields/{id}"),
];

/// Fields of a content model.
pub static FIELDS: ResourceDescriptor =
    ResourceDescriptor::new("Field", "field", "fields", FIELDS_PATHS)
        .with_relationships(&[("fieldset", "fieldset")]);

const AUDIT_LOG_EVENTS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Post, Op::Query, &[], "audit-log-events/query"),
];

/// Audit trail of project activity.
pub static AUDIT_LOG_EVENTS: ResourceDescriptor =
    ResourceDescriptor::new(
        "AuditLogEvent",
        "audit_log_event",
        "audit_log_events",
        AUDIT_LOG_EVENTS_PATHS,
    )
    .with_page_limits(50, 500)
    .with_cursor_pagination()
        .with_body_queries("audit_log_query");

const WEBHOOKS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "webhooks"),
    path(HttpMethod::Get, Op::Find, &["id"], "webhooks/{id}"),
    path(HttpMethod::Post, Op::Create, &[], "webhooks"),
    path(HttpMethod::Put, Op::Update, &["id"], "webhooks/{id}"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "webhooks/{id}"),
];

/// Outgoing webhooks.
pub static WEBHOOKS: ResourceDescriptor =
    ResourceDescriptor::new("Webhook", "webhook", "webhooks", WEBHOOKS_PATHS);

const WEBHOOK_CALLS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "webhook_calls"),
    path(HttpMethod::Get, Op::Find, &["id"], "webhook_calls/{id}"),
    path(
        HttpMethod::Post,
        Op::Resend,
        &["id"],
        "webhook_calls/{id}/resend_webhook",
    ),
];

/// Delivery log of webhooks.
pub static WEBHOOK_CALLS: ResourceDescriptor =
    ResourceDescriptor::new("WebhookCall", "webhook_call", "webhook_calls", WEBHOOK_CALLS_PATHS)
        .with_page_limits(30, 500);

const SEARCH_RESULTS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "search-results"),
];

/// Full-text search over published content.
pub static SEARCH_RESULTS: ResourceDescriptor =
    ResourceDescriptor::new("SearchResult", "search_result", "search_results", SEARCH_RESULTS_PATHS)
        .with_page_limits(20, 100);

const ENVIRONMENTS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "environments"),
    path(HttpMethod::Get, Op::Find, &["id"], "environments/{id}"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "environments/{id}"),
];

/// Sandbox and primary environments.
pub static ENVIRONMENTS: ResourceDescriptor =
    ResourceDescriptor::new("Environment", "environment", "environments", ENVIRONMENTS_PATHS);

const SITE_INVITATIONS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::List, &[], "site-invitations"),
    path(HttpMethod::Get, Op::Find, &["id"], "site-invitations/{id}"),
    path(HttpMethod::Post, Op::Create, &[], "site-invitations"),
    path(HttpMethod::Delete, Op::Destroy, &["id"], "site-invitations/{id}"),
    path(HttpMethod::Post, Op::Resend, &["id"], "site-invitations/{id}/resend"),
];

/// Pending invitations to collaborate on the project.
pub static SITE_INVITATIONS: ResourceDescriptor =
    ResourceDescriptor::new(
        "SiteInvitation",
        "site_invitation",
        "site_invitations",
        SITE_INVITATIONS_PATHS,
    )
    .with_relationships(&[("role", "role")]);

const JOB_RESULTS_PATHS: &[ResourcePath] = &[
    path(HttpMethod::Get, Op::Find, &["id"], "job-results/{id}"),
];

/// Outcomes of asynchronous jobs.
pub static JOB_RESULTS: ResourceDescriptor =
    ResourceDescriptor::new("JobResult", "job_result", "job_results", JOB_RESULTS_PATHS);

/// Every built-in descriptor.
pub static ALL: &[&ResourceDescriptor] = &[
    &UPLOADS,
    &UPLOAD_FILTERS,
    &ITEMS,
    &ITEM_TYPES,
    &FIELDS,
    &AUDIT_LOG_EVENTS,
    &WEBHOOKS,
    &WEBHOOK_CALLS,
    &SEARCH_RESULTS,
    &ENVIRONMENTS,
    &SITE_INVITATIONS,
    &JOB_RESULTS,
];

impl RestClient {
    /// Media library uploads.
    #[must_use]
    pub fn uploads(&self) -> Resource<'_, Value> {
        self.resource(&UPLOADS)
    }

    /// Saved media library searches.
    #[must_use]
    pub fn upload_filters(&self) -> Resource<'_, Value> {
        self.resource(&UPLOAD_FILTERS)
    }

    /// Content records.
    #[must_use]
    pub fn items(&self) -> Resource<'_, Value> {
        self.resource(&ITEMS)
    }

    /// Content models.
    #[must_use]
    pub fn item_types(&self) -> Resource<'_, Value> {
        self.resource(&ITEM_TYPES)
    }

    /// Fields of the content model `item_type_id`.
    ///
    /// The id is only needed for `list` and `create`; the other operations
    /// address fields directly.
    #[must_use]
    pub fn fields(&self, item_type_id: &str) -> Resource<'_, Value> {
        self.resource(&FIELDS)
            .with_path_param("item_type_id", item_type_id)
    }

    /// Audit trail, queried by body with cursor pagination.
    #[must_use]
    pub fn audit_log_events(&self) -> Resource<'_, Value> {
        self.resource(&AUDIT_LOG_EVENTS)
    }

    /// Outgoing webhooks.
    #[must_use]
    pub fn webhooks(&self) -> Resource<'_, Value> {
        self.resource(&WEBHOOKS)
    }

    /// Webhook delivery log.
    #[must_use]
    pub fn webhook_calls(&self) -> Resource<'_, Value> {
        self.resource(&WEBHOOK_CALLS)
    }

    /// Search results.
    #[must_use]
    pub fn search_results(&self) -> Resource<'_, Value> {
        self.resource(&SEARCH_RESULTS)
    }

    /// Environments.
    #[must_use]
    pub fn environments(&self) -> Resource<'_, Value> {
        self.resource(&ENVIRONMENTS)
    }

    /// Site invitations.
    #[must_use]
    pub fn site_invitations(&self) -> Resource<'_, Value> {
        self.resource(&SITE_INVITATIONS)
    }

    /// Job results.
    #[must_use]
    pub fn job_results(&self) -> Resource<'_, Value> {
        self.resource(&JOB_RESULTS)
    }
}
