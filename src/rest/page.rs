//! One page of a listing.
//!
//! [`Page<T>`] pairs the records of a single list round trip with what the
//! caller needs to fetch the next one: `meta.total_count` for offset
//! pagination, `meta.next_token` for cursor pagination, and the page that was
//! actually requested.
//!
//! `Page<T>` derefs to `Vec<T>`:
//!
//! ```rust
//! use cms_client::rest::{Page, PageSpec};
//!
//! let page = Page::new(vec!["a", "b"], Some(PageSpec::offset(0, 2)))
//!     .with_total_count(Some(5));
//!
//! assert_eq!(page.len(), 2);
//! assert_eq!(page[0], "a");
//! assert_eq!(page.next_page(), Some(PageSpec::offset(2, 2)));
//! ```

use std::ops::{Deref, DerefMut};

use crate::clients::RateLimitInfo;
use crate::rest::query::PageSpec;

/// Records from a single list call plus pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    data: Vec<T>,
    requested: Option<PageSpec>,
    total_count: Option<u64>,
    next_token: Option<String>,
    rate_limit: Option<RateLimitInfo>,
    request_id: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page holding `data`, fetched with `requested`.
    #[must_use]
    pub const fn new(data: Vec<T>, requested: Option<PageSpec>) -> Self {
        Self {
            data,
            requested,
            total_count: None,
            next_token: None,
            rate_limit: None,
            request_id: None,
        }
    }

    /// Sets `meta.total_count`.
    #[must_use]
    pub const fn with_total_count(mut self, total_count: Option<u64>) -> Self {
        self.total_count = total_count;
        self
    }

    /// Sets `meta.next_token`.
    #[must_use]
    pub fn with_next_token(mut self, next_token: Option<String>) -> Self {
        self.next_token = next_token;
        self
    }

    /// Sets the response diagnostics.
    #[must_use]
    pub fn with_response_info(
        mut self,
        rate_limit: Option<RateLimitInfo>,
        request_id: Option<String>,
    ) -> Self {
        self.rate_limit = rate_limit;
        self.request_id = request_id;
        self
    }

    /// Returns the page that was requested.
    #[must_use]
    pub const fn requested(&self) -> Option<&PageSpec> {
        self.requested.as_ref()
    }

    /// Returns the size of the whole filtered collection, when reported.
    #[must_use]
    pub const fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Returns the cursor for the next page, when reported.
    #[must_use]
    pub fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }

    /// Returns the offset of this page.
    #[must_use]
    pub fn offset(&self) -> Option<u32> {
        self.requested.as_ref().and_then(PageSpec::offset_value)
    }

    /// Returns the requested page size.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.requested.as_ref().and_then(PageSpec::limit)
    }

    /// Returns the rate-limit headers of the response.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<&RateLimitInfo> {
        self.rate_limit.as_ref()
    }

    /// Returns the `X-Request-Id` of the response.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns `true` if another page should exist.
    ///
    /// Cursor pages have a successor when a `next_token` was returned. Offset
    /// pages have one when the page was full and `total_count`, if reported,
    /// lies beyond it.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        match &self.requested {
            Some(PageSpec::Cursor { .. }) => self.next_token.is_some(),
            Some(PageSpec::Offset { offset, limit }) => {
                let fetched = self.data.len();
                if fetched == 0 || fetched < *limit as usize {
                    return false;
                }
                let end = u64::from(*offset) + fetched as u64;
                self.total_count.map_or(true, |total| end < total)
            }
            None => self.next_token.is_some(),
        }
    }

    /// Returns the spec of the following page, or `None` on the last page.
    #[must_use]
    pub fn next_page(&self) -> Option<PageSpec> {
        if !self.has_next_page() {
            return None;
        }
        match &self.requested {
            Some(PageSpec::Offset { offset, limit }) => {
                let fetched = u32::try_from(self.data.len()).ok()?;
                Some(PageSpec::offset(offset.checked_add(fetched)?, *limit))
            }
            Some(PageSpec::Cursor { limit, .. }) => self
                .next_token
                .as_ref()
                .map(|token| PageSpec::cursor(token.clone(), *limit)),
            None => self
                .next_token
                .as_ref()
                .map(|token| PageSpec::cursor(token.clone(), None)),
        }
    }

    /// Consumes the page and returns the records.
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.data
    }

    /// Returns the records.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Transforms the records, keeping the metadata.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            requested: self.requested,
            total_count: self.total_count,
            next_token: self.next_token,
            rate_limit: self.rate_limit,
            request_id: self.request_id,
        }
    }
}

impl<T> Deref for Page<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for Page<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

// Verify Page is Send + Sync when T is Send + Sync
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Page<serde_json::Value>>();
};
