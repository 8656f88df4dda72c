//! Core traits defined in `schoolhub-core` and implemented by other crates.

pub mod repository;

pub use repository::Repository;
