//! School record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::classroom::Classroom;

/// A school. Schools form a hierarchy: a branch points at its parent school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct School {
    /// Unique school identifier.
    pub id: String,
    /// Parent school for branches.
    pub parent_id: Option<String>,
    /// School name.
    pub name: String,
    /// City the school is located in.
    pub city: Option<String>,
    /// When the school was created.
    pub created_at: DateTime<Utc>,
    /// When the school was last updated.
    pub updated_at: DateTime<Utc>,

    /// The parent school, loaded on demand.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<Box<School>>,
    /// Classrooms of this school, loaded on demand.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub classrooms: Vec<Classroom>,
}

impl School {
    /// Build a new, not yet persisted school.
    pub fn new(name: impl Into<String>, parent_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            parent_id,
            name: name.into(),
            city: None,
            created_at: now,
            updated_at: now,
            parent: None,
            classrooms: Vec::new(),
        }
    }

    /// Check if this is a top-level school (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Names from this school up through its loaded parents.
    pub fn lineage(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        let mut current = self.parent.as_deref();
        while let Some(school) = current {
            names.push(school.name.as_str());
            current = school.parent.as_deref();
        }
        names
    }
}
