//! Core type definitions used across the SchoolHub workspace.

pub mod filter;
pub mod pagination;
pub mod sorting;

pub use filter::RangeFilter;
pub use pagination::{Page, PageRequest};
pub use sorting::{SortDirection, SortField};
