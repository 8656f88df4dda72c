//! Lesson record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::grade::Grade;
use crate::subject::Subject;

/// A scheduled lesson of a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    /// Unique lesson identifier.
    pub id: String,
    /// Subject this lesson belongs to.
    pub subject_id: String,
    /// Lesson topic.
    pub topic: String,
    /// Scheduled start.
    pub starts_at: DateTime<Utc>,
    /// Length in minutes.
    pub duration_minutes: i32,
    /// When the lesson was created.
    pub created_at: DateTime<Utc>,
    /// When the lesson was last updated.
    pub updated_at: DateTime<Utc>,

    /// The owning subject.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject: Option<Box<Subject>>,
    /// Grades given during this lesson.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub grades: Vec<Grade>,
}

impl Lesson {
    /// Build a new, not yet persisted lesson.
    pub fn new(
        subject_id: impl Into<String>,
        topic: impl Into<String>,
        starts_at: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            subject_id: subject_id.into(),
            topic: topic.into(),
            starts_at,
            duration_minutes,
            created_at: now,
            updated_at: now,
            subject: None,
            grades: Vec::new(),
        }
    }

    /// Scheduled end of the lesson.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(i64::from(self.duration_minutes))
    }
}
