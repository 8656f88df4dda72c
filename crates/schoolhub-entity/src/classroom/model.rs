//! Classroom record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::school::School;
use crate::subject::Subject;

/// A classroom (grade group such as `10A`) within a school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    /// Unique classroom identifier.
    pub id: String,
    /// Owning school.
    pub school_id: String,
    /// Classroom name, usually a grade number followed by a letter.
    pub name: String,
    /// When the classroom was created.
    pub created_at: DateTime<Utc>,
    /// When the classroom was last updated.
    pub updated_at: DateTime<Utc>,

    /// The owning school.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub school: Option<Box<School>>,
    /// Subjects taught in this classroom.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub subjects: Vec<Subject>,
}

impl Classroom {
    /// Build a new, not yet persisted classroom.
    pub fn new(school_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            school_id: school_id.into(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            school: None,
            subjects: Vec::new(),
        }
    }
}
