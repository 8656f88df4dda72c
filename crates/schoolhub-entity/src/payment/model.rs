//! Payment record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::PaymentStatus;
use crate::school::School;
use crate::user::User;

/// A tuition or fee payment made by a user to a school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Unique payment identifier.
    pub id: String,
    /// Paying user.
    pub user_id: String,
    /// Receiving school.
    pub school_id: String,
    /// Amount in minor currency units.
    pub amount_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Current status.
    pub status: PaymentStatus,
    /// When the payment settled.
    pub paid_at: Option<DateTime<Utc>>,
    /// When the payment was created.
    pub created_at: DateTime<Utc>,
    /// When the payment was last updated.
    pub updated_at: DateTime<Utc>,

    /// The paying user.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<Box<User>>,
    /// The receiving school.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub school: Option<Box<School>>,
}

impl Payment {
    /// Build a new pending payment.
    pub fn new(
        user_id: impl Into<String>,
        school_id: impl Into<String>,
        amount_cents: i64,
        currency: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            user_id: user_id.into(),
            school_id: school_id.into(),
            amount_cents,
            currency: currency.into(),
            status: PaymentStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
            user: None,
            school: None,
        }
    }

    /// Mark the payment settled at `at`.
    pub fn mark_paid(&mut self, at: DateTime<Utc>) {
        self.status = PaymentStatus::Paid;
        self.paid_at = Some(at);
    }
}
