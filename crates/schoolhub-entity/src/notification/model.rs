//! Notification record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::user::User;

/// An in-app notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: String,
    /// Recipient.
    pub user_id: String,
    /// Short title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Whether the recipient has read the notification.
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was last updated.
    pub updated_at: DateTime<Utc>,

    /// The recipient.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<Box<User>>,
}

impl Notification {
    /// Build a new, unread notification.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            user_id: user_id.into(),
            title: title.into(),
            body: body.into(),
            is_read: false,
            created_at: now,
            updated_at: now,
            user: None,
        }
    }
}
