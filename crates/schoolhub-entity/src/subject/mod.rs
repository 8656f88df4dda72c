//! Subject domain records.

pub mod model;

pub use model::Subject;
