//! School repository implementation.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest};
use schoolhub_entity::{Classroom, School};

use crate::connection::Gateway;
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

use super::classroom;

/// How many ancestors `load_parents` follows at most.
pub const MAX_PARENT_DEPTH: usize = 8;

impl Record for School {
    const ENTITY: &'static str = "School";
    const TABLE: &'static str = "schools";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "parent_id",
        "name",
        "city",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &["parent_id", "name", "city"];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.parent_id.clone())?;
        args.push(self.name.clone())?;
        args.push(self.city.clone())?;
        Ok(())
    }
}

/// Search filter for schools.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchoolFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub parent_id: Option<String>,
    /// `true` selects only top-level schools, `false` only branches.
    pub is_root: Option<bool>,
    /// Matches name or city.
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for SchoolFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("schools.id", self.id.clone())?;
        clause.any_opt("schools.id", self.ids.clone(), "text")?;
        clause.eq_opt("schools.parent_id", self.parent_id.clone())?;
        if let Some(is_root) = self.is_root {
            clause.flag("schools.parent_id", !is_root);
        }
        if let Some(search) = &self.search {
            clause.contains(&["schools.name", "schools.city"], search)?;
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

/// Select description for schools.
///
/// Classrooms are joined and grouped so schools can be sorted by how many
/// classrooms they have.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<School>()
        .join("LEFT JOIN classrooms ON classrooms.school_id = schools.id")
        .group_by("schools.id")
        .sortable("name", "schools.name")
        .sortable("city", "schools.city")
        .sortable("created_at", "schools.created_at")
        .sortable("classrooms", "COUNT(classrooms.id)")
        .default_order("schools.name ASC")
}

fn parent_edge() -> RelationEdge<School, School> {
    RelationEdge::one(
        "parent",
        |s| s.parent_id.clone(),
        |s, parent| s.parent = Some(Box::new(parent)),
    )
}

fn classrooms_edge() -> RelationEdge<School, Classroom> {
    RelationEdge::many(
        "classrooms",
        |s| Some(s.id.clone()),
        |s| &mut s.classrooms,
    )
}

/// Repository for schools.
#[derive(Debug, Clone)]
pub struct SchoolRepository {
    records: EntityRepository<School>,
    parents: PgRelation<School>,
    classrooms: PgRelation<Classroom>,
}

impl SchoolRepository {
    /// Create a new school repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            parents: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<School>(),
                "schools.id",
            ),
            classrooms: PgRelation::new(
                gateway.clone(),
                classroom::related_template(),
                "classrooms.school_id",
            ),
            records: EntityRepository::new(gateway, template()),
        }
    }

    /// Generic record operations.
    pub fn records(&self) -> &EntityRepository<School> {
        &self.records
    }

    /// Attach ancestors up to `depth` levels, one query per level.
    ///
    /// Stops early once no school at the current level has a parent.
    pub async fn load_parents(&self, schools: &mut [School], depth: usize) -> AppResult<()> {
        let edge = parent_edge();
        let mut level: Vec<&mut School> = schools.iter_mut().collect();
        for hop in 0..depth.min(MAX_PARENT_DEPTH) {
            if level.is_empty() {
                break;
            }
            relation::load(&edge, &self.parents, level.iter_mut().map(|s| &mut **s)).await?;
            level = level
                .into_iter()
                .filter_map(|s| s.parent.as_deref_mut())
                .collect();
            debug!(hop, next = level.len(), "Loaded school parents");
        }
        Ok(())
    }

    /// Attach each school's classrooms in natural order.
    pub async fn load_classrooms(&self, schools: &mut [School]) -> AppResult<()> {
        relation::load(&classrooms_edge(), &self.classrooms, schools.iter_mut()).await
    }
}

#[async_trait]
impl Repository<School, SchoolFilter> for SchoolRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<School> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &SchoolFilter) -> AppResult<Page<School>> {
        self.records.list(filter).await
    }

    async fn create(&self, school: &School) -> AppResult<School> {
        self.records.create(school).await
    }

    async fn update(&self, school: &School) -> AppResult<School> {
        self.records.update(school).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}
