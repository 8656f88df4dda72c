//! User repository implementation.

use async_trait::async_trait;
use serde::Deserialize;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest};
use schoolhub_entity::{School, User, UserRole};

use crate::connection::Gateway;
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

impl Record for User {
    const ENTITY: &'static str = "User";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "role",
        "first_name",
        "last_name",
        "phone",
        "email",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &[
        "school_id",
        "role",
        "first_name",
        "last_name",
        "phone",
        "email",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.school_id.clone())?;
        args.push(self.role)?;
        args.push(self.first_name.clone())?;
        args.push(self.last_name.clone())?;
        args.push(self.phone.clone())?;
        args.push(self.email.clone())?;
        Ok(())
    }
}

/// Search filter for users.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub school_id: Option<String>,
    pub school_ids: Option<Vec<String>>,
    pub role: Option<UserRole>,
    /// Matches first name, last name, phone or email.
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for UserFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("users.id", self.id.clone())?;
        clause.any_opt("users.id", self.ids.clone(), "text")?;
        clause.eq_opt("users.school_id", self.school_id.clone())?;
        clause.any_opt("users.school_id", self.school_ids.clone(), "text")?;
        clause.eq_opt("users.role", self.role)?;
        if let Some(search) = &self.search {
            clause.contains(
                &[
                    "users.first_name",
                    "users.last_name",
                    "users.phone",
                    "users.email",
                ],
                search,
            )?;
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

/// Select description for users.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<User>()
        .sortable("first_name", "users.first_name")
        .sortable("last_name", "users.last_name")
        .sortable("role", "users.role")
        .sortable("created_at", "users.created_at")
        .default_order("users.last_name ASC, users.first_name ASC")
}

fn school_edge() -> RelationEdge<User, School> {
    RelationEdge::one(
        "school",
        |u| u.school_id.clone(),
        |u, school| u.school = Some(Box::new(school)),
    )
}

/// Repository for users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    records: EntityRepository<User>,
    schools: PgRelation<School>,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            schools: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<School>(),
                "schools.id",
            ),
            records: EntityRepository::new(gateway, template()),
        }
    }

    /// Generic record operations.
    pub fn records(&self) -> &EntityRepository<User> {
        &self.records
    }

    /// Attach each user's school.
    pub async fn load_school(&self, users: &mut [User]) -> AppResult<()> {
        relation::load(&school_edge(), &self.schools, users.iter_mut()).await
    }

    /// List users with their schools attached.
    pub async fn list_with_school(&self, filter: &UserFilter) -> AppResult<Page<User>> {
        let mut page = self.records.list(filter).await?;
        self.load_school(&mut page.items).await?;
        Ok(page)
    }
}

#[async_trait]
impl Repository<User, UserFilter> for UserRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<User> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Page<User>> {
        self.records.list(filter).await
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        self.records.create(user).await
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        self.records.update(user).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}
