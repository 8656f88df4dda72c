//! User domain records.

pub mod model;
pub mod role;

pub use model::User;
pub use role::UserRole;
