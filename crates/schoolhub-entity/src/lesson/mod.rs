//! Lesson domain records.

pub mod model;

pub use model::Lesson;
