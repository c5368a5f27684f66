//! Lazy iteration over every page of a listing.
//!
//! [`Resource::list_all`] returns a [`Stream`](futures::Stream) of records.
//! Pages are fetched one at a time, only once the records of the previous
//! page have been consumed, so dropping the stream early stops all further
//! requests. Each call starts from the first page again.
//!
//! Offset pages advance by the number of records received and stop on a
//! short or empty page, or once `meta.total_count` is reached. Cursor pages
//! follow `meta.next_token` until the server stops sending one.
//!
//! Offset pagination over a collection that changes while it is being read
//! may skip or repeat records.
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use cms_client::rest::ListParams;
//!
//! let mut uploads = client.uploads().list_all(ListParams::new());
//! while let Some(upload) = uploads.try_next().await? {
//!     println!("{}", upload["filename"]);
//! }
//! ```

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::rest::query::{ListParams, PageSpec};
use crate::rest::resource::Resource;
use crate::rest::ResourceError;

struct Cursor<'c, T> {
    resource: Resource<'c, T>,
    params: ListParams,
    next: Option<PageSpec>,
    fetched: u32,
}

impl<'c, T: DeserializeOwned + Send + 'c> Resource<'c, T> {
    /// Streams every record matching `params`.
    ///
    /// The page in `params`, if any, is the starting page and sets the page
    /// size; otherwise the resource default is used.
    #[must_use]
    pub fn list_all(&self, params: ListParams) -> BoxStream<'c, Result<T, ResourceError>> {
        let first = params.page.clone().unwrap_or_else(|| self.default_page());
        let state = Cursor {
            resource: self.clone(),
            params,
            next: Some(first),
            fetched: 0,
        };

        stream::try_unfold(state, |mut state| async move {
            let Some(spec) = state.next.take() else {
                return Ok(None);
            };

            let params = state.params.clone().page(spec);
            let page = state.resource.list_page(&params).await?;
            state.fetched += 1;

            debug!(
                resource = state.resource.descriptor().name,
                page = state.fetched,
                records = page.len(),
                total_count = ?page.total_count(),
                "Fetched page"
            );

            state.next = if page.is_empty() {
                None
            } else {
                page.next_page()
            };

            let records = stream::iter(page.into_inner().into_iter().map(Ok));
            Ok::<_, ResourceError>(Some((records, state)))
        })
        .try_flatten()
        .boxed()
    }
}
