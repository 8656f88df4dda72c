//! Pagination types for list queries.

use serde::{Deserialize, Serialize};

/// Default page size when a filter does not specify a limit.
pub const DEFAULT_LIMIT: u64 = 25;
/// Maximum page size accepted from a filter.
pub const MAX_LIMIT: u64 = 1000;

/// Limit/offset window requested by a list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of records to return.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Number of matching records to skip.
    #[serde(default)]
    pub offset: Option<u64>,
}

impl PageRequest {
    /// Create a new page request.
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Build a request from the optional `limit`/`offset` fields of a filter.
    pub fn from_parts(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }

    /// Return the SQL `LIMIT` value, capped at [`MAX_LIMIT`].
    ///
    /// An explicit zero stays zero: the caller wants only the total.
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    /// Return the SQL `OFFSET` value.
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The records in this window, in query order.
    pub items: Vec<T>,
    /// Number of records matching the filter, ignoring limit and offset.
    pub total: u64,
    /// Applied limit.
    pub limit: u64,
    /// Applied offset.
    pub offset: u64,
}

impl<T> Page<T> {
    /// Create a new page.
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            limit: request.limit(),
            offset: request.offset(),
        }
    }

    /// Create an empty page.
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    /// Whether more records exist past this window.
    pub fn has_next(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }

    /// Map the records, keeping the window metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
