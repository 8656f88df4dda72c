//! Payment repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest, RangeFilter};
use schoolhub_entity::{Payment, PaymentStatus, School, User};

use crate::connection::Gateway;
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

impl Record for Payment {
    const ENTITY: &'static str = "Payment";
    const TABLE: &'static str = "payments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "school_id",
        "amount_cents",
        "currency",
        "status",
        "paid_at",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &[
        "user_id",
        "school_id",
        "amount_cents",
        "currency",
        "status",
        "paid_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.user_id.clone())?;
        args.push(self.school_id.clone())?;
        args.push(self.amount_cents)?;
        args.push(self.currency.clone())?;
        args.push(self.status)?;
        args.push(self.paid_at)?;
        Ok(())
    }
}

/// Search filter for payments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub user_id: Option<String>,
    pub user_ids: Option<Vec<String>>,
    pub school_id: Option<String>,
    pub status: Option<PaymentStatus>,
    /// Amount in cents, or a `[min, max]` pair.
    pub amount: Option<RangeFilter<i64>>,
    pub created_at: Option<RangeFilter<DateTime<Utc>>>,
    /// `true` selects settled payments, `false` unsettled ones.
    pub paid: Option<bool>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for PaymentFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("payments.id", self.id.clone())?;
        clause.any_opt("payments.id", self.ids.clone(), "text")?;
        clause.eq_opt("payments.user_id", self.user_id.clone())?;
        clause.any_opt("payments.user_id", self.user_ids.clone(), "text")?;
        clause.eq_opt("payments.school_id", self.school_id.clone())?;
        clause.eq_opt("payments.status", self.status)?;
        if let Some(amount) = &self.amount {
            clause.range("payments.amount_cents", amount)?;
        }
        if let Some(created_at) = &self.created_at {
            clause.range("payments.created_at", created_at)?;
        }
        if let Some(paid) = self.paid {
            clause.flag("payments.paid_at", paid);
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

/// Select description for payments.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<Payment>()
        .sortable("amount", "payments.amount_cents")
        .sortable("paid_at", "payments.paid_at")
        .sortable("created_at", "payments.created_at")
        .default_order("payments.created_at DESC")
}

fn user_edge() -> RelationEdge<Payment, User> {
    RelationEdge::one(
        "user",
        |p| Some(p.user_id.clone()),
        |p, user| p.user = Some(Box::new(user)),
    )
}

fn school_edge() -> RelationEdge<Payment, School> {
    RelationEdge::one(
        "school",
        |p| Some(p.school_id.clone()),
        |p, school| p.school = Some(Box::new(school)),
    )
}

/// Repository for payments.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    records: EntityRepository<Payment>,
    users: PgRelation<User>,
    schools: PgRelation<School>,
}

impl PaymentRepository {
    /// Create a new payment repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            users: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<User>(),
                "users.id",
            ),
            schools: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<School>(),
                "schools.id",
            ),
            records: EntityRepository::new(gateway, template()),
        }
    }

    /// Generic record operations.
    pub fn records(&self) -> &EntityRepository<Payment> {
        &self.records
    }

    /// Attach payer and school, fetched concurrently.
    pub async fn load_relations(&self, payments: &mut [Payment]) -> AppResult<()> {
        let user = user_edge();
        let school = school_edge();
        let (users, schools) = tokio::try_join!(
            relation::prefetch(&user, &self.users, payments.iter()),
            relation::prefetch(&school, &self.schools, payments.iter()),
        )?;
        user.stitch(payments.iter_mut(), users);
        school.stitch(payments.iter_mut(), schools);
        Ok(())
    }
}

#[async_trait]
impl Repository<Payment, PaymentFilter> for PaymentRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Payment> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &PaymentFilter) -> AppResult<Page<Payment>> {
        self.records.list(filter).await
    }

    async fn create(&self, payment: &Payment) -> AppResult<Payment> {
        self.records.create(payment).await
    }

    async fn update(&self, payment: &Payment) -> AppResult<Payment> {
        self.records.update(payment).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}
