//! Filter value types shared by entity filter specs.

use serde::{Deserialize, Serialize};

/// An inclusive range constraint on a numeric or timestamp column.
///
/// Deserializes from either a single value (lower bound only) or a
/// two-element array `[lower, upper]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeFilter<T> {
    /// `lower <= column <= upper`.
    Between(T, T),
    /// `column >= lower`.
    From(T),
}

impl<T> RangeFilter<T> {
    /// Return the lower bound.
    pub fn lower(&self) -> &T {
        match self {
            Self::Between(lower, _) | Self::From(lower) => lower,
        }
    }

    /// Return the upper bound, if any.
    pub fn upper(&self) -> Option<&T> {
        match self {
            Self::Between(_, upper) => Some(upper),
            Self::From(_) => None,
        }
    }
}
