//! User record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::UserRole;
use crate::school::School;

/// A person registered with the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// School the user belongs to (none for platform admins).
    pub school_id: Option<String>,
    /// Role within the school.
    pub role: UserRole,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Phone number used for SMS notifications.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,

    /// The user's school.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub school: Option<Box<School>>,
}

impl User {
    /// Build a new, not yet persisted user.
    pub fn new(
        school_id: Option<String>,
        role: UserRole,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            school_id,
            role,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            email: None,
            created_at: now,
            updated_at: now,
            school: None,
        }
    }

    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
