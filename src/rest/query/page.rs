//! Page specifications.

use super::QueryError;

/// Which page to fetch.
///
/// Offset and cursor pagination are mutually exclusive; the variant
/// matches the resource's [`PaginationStyle`](crate::rest::PaginationStyle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSpec {
    /// `page[offset]` / `page[limit]`.
    Offset {
        /// Items to skip.
        offset: u32,
        /// Items to return.
        limit: u32,
    },
    /// `next_token` cursor.
    Cursor {
        /// The token from the previous page, `None` for the first page.
        cursor: Option<String>,
        /// Items to return, or the resource default.
        limit: Option<u32>,
    },
}

impl PageSpec {
    /// An offset page.
    #[must_use]
    pub const fn offset(offset: u32, limit: u32) -> Self {
        Self::Offset { offset, limit }
    }

    /// The first page of a cursor-paginated listing.
    #[must_use]
    pub const fn first(limit: Option<u32>) -> Self {
        Self::Cursor {
            cursor: None,
            limit,
        }
    }

    /// The page following `cursor`.
    #[must_use]
    pub fn cursor(cursor: impl Into<String>, limit: Option<u32>) -> Self {
        Self::Cursor {
            cursor: Some(cursor.into()),
            limit,
        }
    }

    /// Returns the requested limit, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        match self {
            Self::Offset { limit, .. } => Some(*limit),
            Self::Cursor { limit, .. } => *limit,
        }
    }

    /// Returns the offset for offset pages.
    #[must_use]
    pub const fn offset_value(&self) -> Option<u32> {
        match self {
            Self::Offset { offset, .. } => Some(*offset),
            Self::Cursor { .. } => None,
        }
    }

    /// Checks the limit against the resource maximum.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyPage`] for a limit of zero and
    /// [`QueryError::PageLimitExceeded`] for a limit above `max`.
    pub fn validate(&self, max: u32) -> Result<(), QueryError> {
        match self.limit() {
            Some(0) => Err(QueryError::EmptyPage),
            Some(limit) if limit > max => Err(QueryError::PageLimitExceeded { limit, max }),
            _ => Ok(()),
        }
    }
}
