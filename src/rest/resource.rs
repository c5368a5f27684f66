//! The generic resource handle.
//!
//! A [`Resource`] binds a [`RestClient`] to a [`ResourceDescriptor`] and
//! exposes the canonical operations for it. There is one implementation for
//! every resource; what differs between resources lives in the descriptor.
//!
//! Each operation has a simple form, returning records deserialized into `T`
//! (`serde_json::Value` unless chosen otherwise), and a `raw_` form returning
//! the untouched [`Envelope`]. Both share a single request path.
//!
//! Operations the descriptor does not declare fail with
//! [`ResourceError::UnsupportedOperation`] before anything is sent.
//!
//! # Example
//!
//! ```rust,ignore
//! use cms_client::rest::{FilterOperator, FilterSpec, ListParams, PageSpec};
//!
//! let images = client
//!     .uploads()
//!     .list(
//!         &ListParams::new()
//!             .filter(FilterSpec::new().field("type", FilterOperator::Eq, "image"))
//!             .page(PageSpec::offset(0, 20)),
//!     )
//!     .await?;
//!
//! let filter = client
//!     .upload_filters()
//!     .create(&serde_json::json!({"name": "Large images", "filter": {}}))
//!     .await?;
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clients::{HttpMethod, HttpResponse, RestClient};
use crate::rest::descriptor::{ListEncoding, PaginationStyle, ResourceDescriptor};
use crate::rest::envelope::{to_document, Envelope};
use crate::rest::jobs::JobHandle;
use crate::rest::page::Page;
use crate::rest::path::{build_path, ResourceOperation};
use crate::rest::query::{ListParams, PageSpec, QueryError, QueryParameters};
use crate::rest::tracking::TrackedResource;
use crate::rest::ResourceError;

/// Operations on one resource type.
///
/// Obtained from [`RestClient::resource`] or one of the named accessors such
/// as [`RestClient::uploads`]. Cheap to create and to clone.
pub struct Resource<'c, T = Value> {
    client: &'c RestClient,
    descriptor: &'static ResourceDescriptor,
    cancellation: Option<CancellationToken>,
    path_params: Vec<(String, String)>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<'_, T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client,
            descriptor: self.descriptor,
            cancellation: self.cancellation.clone(),
            path_params: self.path_params.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Resource<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("resource", &self.descriptor.name)
            .field("path_params", &self.path_params)
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Returns a handle for any resource descriptor.
    #[must_use]
    pub fn resource<T>(&self, descriptor: &'static ResourceDescriptor) -> Resource<'_, T> {
        Resource::new(self, descriptor)
    }
}

impl<'c, T> Resource<'c, T> {
    /// Creates a handle.
    #[must_use]
    pub const fn new(client: &'c RestClient, descriptor: &'static ResourceDescriptor) -> Self {
        Self {
            client,
            descriptor,
            cancellation: None,
            path_params: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Threads a cancellation token through every call made by this handle.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Supplies a path placeholder other than `id`, e.g. `item_type_id`.
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    /// Returns the descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &'static ResourceDescriptor {
        self.descriptor
    }

    /// Returns the client.
    #[must_use]
    pub const fn client(&self) -> &'c RestClient {
        self.client
    }

    /// Switches the record type.
    #[must_use]
    pub fn typed<U>(self) -> Resource<'c, U> {
        Resource {
            client: self.client,
            descriptor: self.descriptor,
            cancellation: self.cancellation,
            path_params: self.path_params,
            _record: PhantomData,
        }
    }

    /// Lists records and returns the untouched envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Query`] for invalid parameters (no request is
    /// sent) and the classified server error otherwise.
    pub async fn raw_list(&self, params: &ListParams) -> Result<Envelope, ResourceError> {
        let operation = self.descriptor.list_operation();
        let (envelope, _) = self.fetch_list(operation, params).await?;
        Ok(envelope)
    }

    /// Runs a body-encoded query and returns the untouched envelope.
    ///
    /// # Errors
    ///
    /// See [`raw_list`](Self::raw_list).
    pub async fn raw_query(&self, params: &ListParams) -> Result<Envelope, ResourceError> {
        let (envelope, _) = self.fetch_list(ResourceOperation::Query, params).await?;
        Ok(envelope)
    }

    /// Fetches one record and returns the untouched envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] carrying `id` on a 404.
    pub async fn raw_find(&self, id: &str) -> Result<Envelope, ResourceError> {
        let response = self
            .request(ResourceOperation::Find, Some(id), None, Vec::new())
            .await?;
        self.parse_envelope(response.body)
    }

    /// Creates a record and returns the untouched envelope.
    ///
    /// `body` is a simple object; relationship attributes are turned into
    /// linkage. A `202` job answer is waited on.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ValidationFailed`] when the server rejects the
    /// payload.
    pub async fn raw_create<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<Envelope, ResourceError> {
        let document = self.document(None, body)?;
        let response = self
            .request(ResourceOperation::Create, None, Some(document), Vec::new())
            .await?;
        self.settle(response).await
    }

    /// Updates a record and returns the untouched envelope.
    ///
    /// Attributes missing from `body` are left unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`raw_create`](Self::raw_create), plus
    /// [`ResourceError::NotFound`] on a 404.
    pub async fn raw_update<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<Envelope, ResourceError> {
        let document = self.document(Some(id), body)?;
        let response = self
            .request(ResourceOperation::Update, Some(id), Some(document), Vec::new())
            .await?;
        self.settle(response).await
    }

    /// Deletes a record and returns the untouched envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] or [`ResourceError::Conflict`].
    pub async fn raw_destroy(&self, id: &str) -> Result<Envelope, ResourceError> {
        let response = self
            .request(ResourceOperation::Destroy, Some(id), None, Vec::new())
            .await?;
        self.settle(response).await
    }

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// See [`raw_destroy`](Self::raw_destroy).
    pub async fn destroy(&self, id: &str) -> Result<(), ResourceError> {
        self.raw_destroy(id).await.map(|_| ())
    }

    /// Starts deleting several records in one job.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Decode`] if the server does not answer with a
    /// job document.
    pub async fn bulk_destroy<S: AsRef<str>>(&self, ids: &[S]) -> Result<JobHandle, ResourceError> {
        let operation_type = self.descriptor.bulk_destroy_type.map_or_else(
            || format!("{}_bulk_destroy_operation", self.descriptor.entity_type),
            ToString::to_string,
        );
        let targets: Vec<Value> = ids
            .iter()
            .map(|id| json!({"type": self.descriptor.entity_type, "id": id.as_ref()}))
            .collect();
        let document = json!({
            "data": {
                "type": operation_type,
                "attributes": {},
                "relationships": {
                    (self.descriptor.collection): {"data": targets}
                }
            }
        });

        let response = self
            .request(ResourceOperation::BulkDestroy, None, Some(document), Vec::new())
            .await?;

        JobHandle::from_body(&response.body).ok_or_else(|| ResourceError::Decode {
            resource: self.descriptor.name,
            message: "expected a job document".to_string(),
        })
    }

    /// Re-delivers a record, e.g. a webhook call or an invitation.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] carrying `id` on a 404.
    pub async fn resend(&self, id: &str) -> Result<(), ResourceError> {
        self.request(ResourceOperation::Resend, Some(id), None, Vec::new())
            .await
            .map(|_| ())
    }

    /// Sends the request for `operation` and returns the successful response.
    async fn request(
        &self,
        operation: ResourceOperation,
        id: Option<&str>,
        body: Option<Value>,
        query: Vec<(String, String)>,
    ) -> Result<HttpResponse, ResourceError> {
        let (method, path) = self.resolve(operation, id)?;

        debug!(
            resource = self.descriptor.name,
            %operation,
            %method,
            path = %path,
            "Sending resource request"
        );

        self.client
            .send(method, &path, body, query, self.cancellation.clone())
            .await
            .map_err(|e| ResourceError::from_rest_error(e, self.descriptor.name, id))
    }

    /// Picks and fills the path for `operation`.
    fn resolve(
        &self,
        operation: ResourceOperation,
        id: Option<&str>,
    ) -> Result<(HttpMethod, String), ResourceError> {
        if !self.descriptor.supports(operation) {
            return Err(ResourceError::UnsupportedOperation {
                resource: self.descriptor.name,
                operation: operation.as_str(),
            });
        }

        let mut ids: Vec<(&str, &str)> = self
            .path_params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        if let Some(id) = id {
            ids.push(("id", id));
        }
        let available: Vec<&str> = ids.iter().map(|(name, _)| *name).collect();

        let unresolved = || ResourceError::PathResolutionFailed {
            resource: self.descriptor.name,
            operation: operation.as_str(),
        };
        let path = self
            .descriptor
            .path_for(operation, &available)
            .ok_or_else(unresolved)?;
        let url = build_path(path.template, &ids).ok_or_else(unresolved)?;

        Ok((path.http_method, url))
    }

    /// Validates list parameters, filling in the page if `default_page`.
    fn encode_list(
        &self,
        params: &ListParams,
        default_page: bool,
    ) -> Result<QueryParameters, ResourceError> {
        let mut params = params.clone();
        match (&params.page, self.descriptor.pagination) {
            (Some(PageSpec::Offset { .. }), PaginationStyle::Cursor) => {
                return Err(QueryError::PaginationMismatch { expected: "cursor" }.into());
            }
            (Some(PageSpec::Cursor { .. }), PaginationStyle::Offset) => {
                return Err(QueryError::PaginationMismatch { expected: "offset" }.into());
            }
            (None, _) if default_page => params.page = Some(self.default_page()),
            _ => {}
        }
        Ok(params.encode(self.descriptor.max_page_limit)?)
    }

    /// Returns the first page at the resource's default size.
    #[must_use]
    pub fn default_page(&self) -> PageSpec {
        match self.descriptor.pagination {
            PaginationStyle::Offset => PageSpec::offset(0, self.descriptor.default_page_limit),
            PaginationStyle::Cursor => PageSpec::first(Some(self.descriptor.default_page_limit)),
        }
    }

    async fn fetch_list(
        &self,
        operation: ResourceOperation,
        params: &ListParams,
    ) -> Result<(Envelope, HttpResponse), ResourceError> {
        let encoded = self.encode_list(params, false)?;
        self.send_list(operation, &encoded).await
    }

    async fn send_list(
        &self,
        operation: ResourceOperation,
        encoded: &QueryParameters,
    ) -> Result<(Envelope, HttpResponse), ResourceError> {
        let body_encoded = operation == ResourceOperation::Query
            || self.descriptor.list_encoding == ListEncoding::Body;

        let mut response = if body_encoded {
            let query_type = self
                .descriptor
                .query_type
                .unwrap_or(self.descriptor.entity_type);
            self.request(operation, None, Some(encoded.to_json_body(query_type)), Vec::new())
                .await?
        } else {
            self.request(operation, None, None, encoded.to_query_pairs())
                .await?
        };

        let body = std::mem::take(&mut response.body);
        Ok((self.parse_envelope(body)?, response))
    }

    /// Resolves a `202` job answer, otherwise parses the body.
    async fn settle(&self, response: HttpResponse) -> Result<Envelope, ResourceError> {
        if response.code == 202 {
            if let Some(job) = JobHandle::from_body(&response.body) {
                debug!(resource = self.descriptor.name, job_id = %job.id, "Waiting for job");
                let policy = self.client.config().job_poll_policy().clone();
                let result = self
                    .client
                    .wait_for_job_with(&job, &policy, self.cancellation.clone())
                    .await?;
                return self.parse_envelope(result);
            }
        }
        self.parse_envelope(response.body)
    }

    fn parse_envelope(&self, body: Value) -> Result<Envelope, ResourceError> {
        if body.is_null() {
            return Ok(Envelope::default());
        }
        Envelope::from_value(body).map_err(|e| ResourceError::Decode {
            resource: self.descriptor.name,
            message: e.to_string(),
        })
    }

    fn document<B: Serialize + ?Sized>(
        &self,
        id: Option<&str>,
        body: &B,
    ) -> Result<Value, ResourceError> {
        let value = serde_json::to_value(body).map_err(|e| ResourceError::InvalidPayload {
            resource: self.descriptor.name,
            reason: e.to_string(),
        })?;

        to_document(
            self.descriptor.entity_type,
            id,
            value,
            self.descriptor.relationships,
        )
        .ok_or_else(|| ResourceError::InvalidPayload {
            resource: self.descriptor.name,
            reason: "body must be a JSON object".to_string(),
        })
    }
}

impl<T: DeserializeOwned> Resource<'_, T> {
    /// Lists records.
    ///
    /// Without a page in `params` the server's default page is returned; use
    /// [`list_page`](Self::list_page) or [`list_all`](Self::list_all) to
    /// paginate.
    ///
    /// # Errors
    ///
    /// See [`raw_list`](Self::raw_list).
    pub async fn list(&self, params: &ListParams) -> Result<Vec<T>, ResourceError> {
        let envelope = self.raw_list(params).await?;
        self.decode(envelope.simple_data())
    }

    /// Runs a body-encoded query.
    ///
    /// # Errors
    ///
    /// See [`raw_list`](Self::raw_list).
    pub async fn query(&self, params: &ListParams) -> Result<Vec<T>, ResourceError> {
        let envelope = self.raw_query(params).await?;
        self.decode(envelope.simple_data())
    }

    /// Fetches one page along with its pagination metadata.
    ///
    /// Uses the resource's default page when `params` has none.
    ///
    /// # Errors
    ///
    /// See [`raw_list`](Self::raw_list).
    pub async fn list_page(&self, params: &ListParams) -> Result<Page<T>, ResourceError> {
        let encoded = self.encode_list(params, true)?;
        let (envelope, response) = self
            .send_list(self.descriptor.list_operation(), &encoded)
            .await?;

        let records: Vec<T> = self.decode(envelope.simple_data())?;
        let request_id = response.request_id().map(ToString::to_string);

        Ok(Page::new(records, encoded.page().cloned())
            .with_total_count(envelope.total_count())
            .with_next_token(envelope.meta.next_token)
            .with_response_info(response.rate_limit, request_id))
    }

    /// Fetches one record.
    ///
    /// # Errors
    ///
    /// See [`raw_find`](Self::raw_find).
    pub async fn find(&self, id: &str) -> Result<T, ResourceError> {
        let envelope = self.raw_find(id).await?;
        self.decode(envelope.simple_data())
    }

    /// Creates a record.
    ///
    /// # Errors
    ///
    /// See [`raw_create`](Self::raw_create).
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T, ResourceError> {
        let envelope = self.raw_create(body).await?;
        self.decode(envelope.simple_data())
    }

    /// Updates a record.
    ///
    /// # Errors
    ///
    /// See [`raw_update`](Self::raw_update).
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<T, ResourceError> {
        let envelope = self.raw_update(id, body).await?;
        self.decode(envelope.simple_data())
    }

    fn decode<U: DeserializeOwned>(&self, value: Value) -> Result<U, ResourceError> {
        serde_json::from_value(value).map_err(|e| ResourceError::Decode {
            resource: self.descriptor.name,
            message: e.to_string(),
        })
    }
}

impl<T: Serialize + DeserializeOwned + Clone> Resource<'_, T> {
    /// Sends the attributes changed since `tracked` was loaded.
    ///
    /// Does nothing when nothing changed. On success `tracked` holds the
    /// server's copy and is clean again.
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub async fn save_changes(
        &self,
        id: &str,
        tracked: &mut TrackedResource<T>,
    ) -> Result<(), ResourceError> {
        let changes = tracked.changed_attributes();
        if changes.is_empty() {
            debug!(resource = self.descriptor.name, id, "No changes to save");
            return Ok(());
        }

        let updated = self.update(id, &Value::Object(changes)).await?;
        tracked.reset(updated);
        Ok(())
    }
}

// Verify Resource is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Resource<'static, Value>>();
};
