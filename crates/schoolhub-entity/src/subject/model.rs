//! Subject record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::lesson::Lesson;
use crate::user::User;

/// A subject taught to one classroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Classroom the subject is taught in.
    pub classroom_id: String,
    /// Assigned teacher.
    pub teacher_id: Option<String>,
    /// Subject name.
    pub name: String,
    /// When the subject was created.
    pub created_at: DateTime<Utc>,
    /// When the subject was last updated.
    pub updated_at: DateTime<Utc>,

    /// The assigned teacher.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub teacher: Option<Box<User>>,
    /// Lessons of this subject.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub lessons: Vec<Lesson>,
}

impl Subject {
    /// Build a new, not yet persisted subject.
    pub fn new(classroom_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            classroom_id: classroom_id.into(),
            teacher_id: None,
            name: name.into(),
            created_at: now,
            updated_at: now,
            teacher: None,
            lessons: Vec::new(),
        }
    }
}
