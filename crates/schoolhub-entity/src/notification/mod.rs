//! Notification domain records.

pub mod model;

pub use model::Notification;
