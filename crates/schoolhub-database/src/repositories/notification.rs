//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest, RangeFilter};
use schoolhub_entity::{Notification, User};

use crate::batch::{BatchReport, Statement};
use crate::connection::{Gateway, Operation};
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

const MARK_READ: &str =
    "UPDATE notifications SET is_read = TRUE, updated_at = NOW() WHERE id = $1 AND is_read = FALSE";

impl Record for Notification {
    const ENTITY: &'static str = "Notification";
    const TABLE: &'static str = "notifications";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "title",
        "body",
        "is_read",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &["user_id", "title", "body", "is_read"];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.user_id.clone())?;
        args.push(self.title.clone())?;
        args.push(self.body.clone())?;
        args.push(self.is_read)?;
        Ok(())
    }
}

/// Search filter for notifications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub user_id: Option<String>,
    pub user_ids: Option<Vec<String>>,
    pub is_read: Option<bool>,
    /// Matches title or body.
    pub search: Option<String>,
    pub created_at: Option<RangeFilter<DateTime<Utc>>>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for NotificationFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("notifications.id", self.id.clone())?;
        clause.any_opt("notifications.id", self.ids.clone(), "text")?;
        clause.eq_opt("notifications.user_id", self.user_id.clone())?;
        clause.any_opt("notifications.user_id", self.user_ids.clone(), "text")?;
        clause.eq_opt("notifications.is_read", self.is_read)?;
        if let Some(search) = &self.search {
            clause.contains(&["notifications.title", "notifications.body"], search)?;
        }
        if let Some(created_at) = &self.created_at {
            clause.range("notifications.created_at", created_at)?;
        }
        Ok(())
    }

    fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    fn page(&self) -> PageRequest {
        PageRequest::from_parts(self.limit, self.offset)
    }
}

/// Select description for notifications.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<Notification>()
        .sortable("created_at", "notifications.created_at")
        .sortable("title", "notifications.title")
        .default_order("notifications.created_at DESC")
}

fn user_edge() -> RelationEdge<Notification, User> {
    RelationEdge::one(
        "user",
        |n| Some(n.user_id.clone()),
        |n, user| n.user = Some(Box::new(user)),
    )
}

/// Repository for notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    records: EntityRepository<Notification>,
    users: PgRelation<User>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            users: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<User>(),
                "users.id",
            ),
            records: EntityRepository::new(gateway, template()),
        }
    }

    /// Generic record operations.
    pub fn records(&self) -> &EntityRepository<Notification> {
        &self.records
    }

    /// Mark one notification read. Returns `false` if it was already read
    /// or does not exist.
    pub async fn mark_read(&self, id: &str) -> AppResult<bool> {
        let mut args = ArgList::new();
        args.push(id.to_string())?;
        let affected = self
            .records
            .gateway()
            .execute(
                Operation::write(Notification::ENTITY, "mark_read"),
                MARK_READ,
                args.into_inner(),
            )
            .await?;
        Ok(affected > 0)
    }

    /// Mark many notifications read on one connection.
    ///
    /// Stops at the first failing statement; earlier ones stay applied.
    pub async fn mark_read_many(&self, ids: &[String]) -> AppResult<BatchReport> {
        self.records
            .batch()
            .run(
                Operation::write(Notification::ENTITY, "mark_read_many"),
                ids,
                |id| {
                    let mut args = ArgList::new();
                    args.push(id.clone())?;
                    Ok(Statement::new(MARK_READ, args))
                },
            )
            .await
    }

    /// Attach each notification's recipient.
    pub async fn load_user(&self, notifications: &mut [Notification]) -> AppResult<()> {
        relation::load(&user_edge(), &self.users, notifications.iter_mut()).await
    }
}

#[async_trait]
impl Repository<Notification, NotificationFilter> for NotificationRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Notification> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &NotificationFilter) -> AppResult<Page<Notification>> {
        self.records.list(filter).await
    }

    async fn create(&self, notification: &Notification) -> AppResult<Notification> {
        self.records.create(notification).await
    }

    async fn update(&self, notification: &Notification) -> AppResult<Notification> {
        self.records.update(notification).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}
