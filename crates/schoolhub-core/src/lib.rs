//! # schoolhub-core
//!
//! Core crate for the SchoolHub data layer. Contains the unified error
//! system, configuration schemas, pagination/sorting/filter value types,
//! and the generic repository trait implemented by `schoolhub-database`.
//!
//! This crate has **no** internal dependencies on other SchoolHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
