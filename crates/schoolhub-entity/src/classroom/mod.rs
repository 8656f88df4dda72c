//! Classroom domain records.

pub mod model;

pub use model::Classroom;
