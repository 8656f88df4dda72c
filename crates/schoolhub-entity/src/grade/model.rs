//! Grade record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::lesson::Lesson;
use crate::user::User;

/// A grade given to a student for a lesson.
///
/// `(lesson_id, student_id)` is a natural key: a student has at most one
/// grade per lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Grade {
    /// Unique grade identifier.
    pub id: String,
    /// Lesson the grade was given in.
    pub lesson_id: String,
    /// Graded student.
    pub student_id: String,
    /// Grade value.
    pub value: i32,
    /// Optional teacher comment.
    pub comment: Option<String>,
    /// When the grade was created.
    pub created_at: DateTime<Utc>,
    /// When the grade was last updated.
    pub updated_at: DateTime<Utc>,

    /// The graded student.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub student: Option<Box<User>>,
    /// The lesson.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lesson: Option<Box<Lesson>>,
}

impl Grade {
    /// Build a new, not yet persisted grade.
    pub fn new(lesson_id: impl Into<String>, student_id: impl Into<String>, value: i32) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            lesson_id: lesson_id.into(),
            student_id: student_id.into(),
            value,
            comment: None,
            created_at: now,
            updated_at: now,
            student: None,
            lesson: None,
        }
    }
}
