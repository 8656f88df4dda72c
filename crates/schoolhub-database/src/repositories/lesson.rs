//! Lesson repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest, RangeFilter};
use schoolhub_entity::{Grade, Lesson, Subject};

use crate::connection::Gateway;
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

use super::subject;

impl Record for Lesson {
    const ENTITY: &'static str = "Lesson";
    const TABLE: &'static str = "lessons";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "subject_id",
        "topic",
        "starts_at",
        "duration_minutes",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] =
        &["subject_id", "topic", "starts_at", "duration_minutes"];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.subject_id.clone())?;
        args.push(self.topic.clone())?;
        args.push(self.starts_at)?;
        args.push(self.duration_minutes)?;
        Ok(())
    }
}

/// Search filter for lessons.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LessonFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub subject_id: Option<String>,
    pub subject_ids: Option<Vec<String>>,
    /// Lessons of any subject taught in this classroom.
    pub classroom_id: Option<String>,
    /// A start time, or a `[from, to]` pair.
    pub starts_at: Option<RangeFilter<DateTime<Utc>>>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for LessonFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("lessons.id", self.id.clone())?;
        clause.any_opt("lessons.id", self.ids.clone(), "text")?;
        clause.eq_opt("lessons.subject_id", self.subject_id.clone())?;
        clause.any_opt("lessons.subject_id", self.subject_ids.clone(), "text")?;
        clause.eq_opt("subjects.classroom_id", self.classroom_id.clone())?;
        if let Some(starts_at) = &self.starts_at {
            clause.range("lessons.starts_at", starts_at)?;
        }
        if let Some(search) = &self.search {
            clause.contains(&["lessons.topic", "subjects.name"], search)?;
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

/// Select description for lessons.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<Lesson>()
        .join("INNER JOIN subjects ON subjects.id = lessons.subject_id")
        .sortable("starts_at", "lessons.starts_at")
        .sortable("topic", "lessons.topic")
        .sortable("subject", "subjects.name")
        .sortable("created_at", "lessons.created_at")
        .default_order("lessons.starts_at ASC")
}

pub(crate) fn related_template() -> QueryTemplate {
    QueryTemplate::for_record::<Lesson>().default_order("lessons.starts_at ASC")
}

fn subject_edge() -> RelationEdge<Lesson, Subject> {
    RelationEdge::one(
        "subject",
        |l| Some(l.subject_id.clone()),
        |l, subject| l.subject = Some(Box::new(subject)),
    )
}

fn grades_edge() -> RelationEdge<Lesson, Grade> {
    RelationEdge::many("grades", |l| Some(l.id.clone()), |l| &mut l.grades)
}

/// Repository for lessons.
#[derive(Debug, Clone)]
pub struct LessonRepository {
    records: EntityRepository<Lesson>,
    subjects: PgRelation<Subject>,
    grades: PgRelation<Grade>,
}

impl LessonRepository {
    /// Create a new lesson repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            subjects: PgRelation::new(
                gateway.clone(),
                subject::related_template(),
                "subjects.id",
            ),
            grades: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<Grade>().default_order("grades.created_at ASC"),
                "grades.lesson_id",
            ),
            records: EntityRepository::new(gateway, template()),
        }
    }

    /// Generic record operations.
    pub fn records(&self) -> &EntityRepository<Lesson> {
        &self.records
    }

    /// Attach each lesson's subject.
    pub async fn load_subject(&self, lessons: &mut [Lesson]) -> AppResult<()> {
        relation::load(&subject_edge(), &self.subjects, lessons.iter_mut()).await
    }

    /// Attach each lesson's grades.
    pub async fn load_grades(&self, lessons: &mut [Lesson]) -> AppResult<()> {
        relation::load(&grades_edge(), &self.grades, lessons.iter_mut()).await
    }
}

#[async_trait]
impl Repository<Lesson, LessonFilter> for LessonRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Lesson> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &LessonFilter) -> AppResult<Page<Lesson>> {
        self.records.list(filter).await
    }

    async fn create(&self, lesson: &Lesson) -> AppResult<Lesson> {
        self.records.create(lesson).await
    }

    async fn update(&self, lesson: &Lesson) -> AppResult<Lesson> {
        self.records.update(lesson).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}
