//! Sorting types for list queries.
//!
//! Sort values arrive as plain field names. A bare name sorts descending;
//! a name suffixed with [`REVERSE_MARKER`] sorts ascending.

use serde::{Deserialize, Serialize};

/// Suffix that flips the default descending order to ascending.
pub const REVERSE_MARKER: char = '~';

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Return the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A normalized sort specification consisting of a field name and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Field name, with any reversal marker removed.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create an ascending sort on the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Create a descending sort on the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Parse a raw sort value such as `"name"` or `"name~"`.
    ///
    /// Returns `None` for blank input. The raw value is left untouched.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.strip_suffix(REVERSE_MARKER) {
            Some(field) if !field.trim().is_empty() => Some(Self::asc(field.trim())),
            Some(_) => None,
            None if raw.is_empty() => None,
            None => Some(Self::desc(raw)),
        }
    }
}
