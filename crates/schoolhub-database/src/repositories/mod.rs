//! Repository implementations for all SchoolHub entities.

pub mod classroom;
pub mod grade;
pub mod lesson;
pub mod notification;
pub mod payment;
pub mod school;
pub mod subject;
pub mod user;

pub use classroom::{ClassroomFilter, ClassroomRepository};
pub use grade::{GradeFilter, GradeRepository};
pub use lesson::{LessonFilter, LessonRepository};
pub use notification::{NotificationFilter, NotificationRepository};
pub use payment::{PaymentFilter, PaymentRepository};
pub use school::{SchoolFilter, SchoolRepository};
pub use subject::{SubjectFilter, SubjectRepository};
pub use user::{UserFilter, UserRepository};
