//! School domain records.

pub mod model;

pub use model::School;
