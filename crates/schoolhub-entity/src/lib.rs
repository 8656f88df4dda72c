//! # schoolhub-entity
//!
//! Domain record models for SchoolHub. Every struct in this crate
//! represents a database table row. Records derive `sqlx::FromRow`; their
//! relation fields are marked `#[sqlx(skip)]` so the base select never
//! touches them and only the relation loader fills them in.

pub mod classroom;
pub mod grade;
pub mod lesson;
pub mod notification;
pub mod payment;
pub mod school;
pub mod subject;
pub mod user;

pub use classroom::Classroom;
pub use grade::Grade;
pub use lesson::Lesson;
pub use notification::Notification;
pub use payment::{Payment, PaymentStatus};
pub use school::School;
pub use subject::Subject;
pub use user::{User, UserRole};

/// Generate a new surrogate primary key.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
