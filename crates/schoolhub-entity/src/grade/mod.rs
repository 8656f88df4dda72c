//! Grade domain records.

pub mod model;

pub use model::Grade;
