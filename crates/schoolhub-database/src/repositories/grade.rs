//! Grade repository implementation.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest, RangeFilter};
use schoolhub_entity::{Grade, Lesson, User};

use crate::connection::Gateway;
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

use super::lesson;

/// A student has at most one grade per lesson.
pub const NATURAL_KEY: &[&str] = &["lesson_id", "student_id"];

impl Record for Grade {
    const ENTITY: &'static str = "Grade";
    const TABLE: &'static str = "grades";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "lesson_id",
        "student_id",
        "value",
        "comment",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &["lesson_id", "student_id", "value", "comment"];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.lesson_id.clone())?;
        args.push(self.student_id.clone())?;
        args.push(self.value)?;
        args.push(self.comment.clone())?;
        Ok(())
    }
}

/// Search filter for grades.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GradeFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub lesson_id: Option<String>,
    pub lesson_ids: Option<Vec<String>>,
    pub student_id: Option<String>,
    pub student_ids: Option<Vec<String>>,
    pub value: Option<RangeFilter<i32>>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for GradeFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("grades.id", self.id.clone())?;
        clause.any_opt("grades.id", self.ids.clone(), "text")?;
        clause.eq_opt("grades.lesson_id", self.lesson_id.clone())?;
        clause.any_opt("grades.lesson_id", self.lesson_ids.clone(), "text")?;
        clause.eq_opt("grades.student_id", self.student_id.clone())?;
        clause.any_opt("grades.student_id", self.student_ids.clone(), "text")?;
        if let Some(value) = &self.value {
            clause.range("grades.value", value)?;
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

/// Select description for grades.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<Grade>()
        .sortable("value", "grades.value")
        .sortable("created_at", "grades.created_at")
        .default_order("grades.created_at DESC")
}

fn student_edge() -> RelationEdge<Grade, User> {
    RelationEdge::one(
        "student",
        |g| Some(g.student_id.clone()),
        |g, student| g.student = Some(Box::new(student)),
    )
}

fn lesson_edge() -> RelationEdge<Grade, Lesson> {
    RelationEdge::one(
        "lesson",
        |g| Some(g.lesson_id.clone()),
        |g, lesson| g.lesson = Some(Box::new(lesson)),
    )
}

/// Repository for grades.
#[derive(Debug, Clone)]
pub struct GradeRepository {
    records: EntityRepository<Grade>,
    students: PgRelation<User>,
    lessons: PgRelation<Lesson>,
}

impl GradeRepository {
    /// Create a new grade repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            students: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<User>(),
                "users.id",
            ),
            lessons: PgRelation::new(
                gateway.clone(),
                lesson::related_template(),
                "lessons.id",
            ),
            records: EntityRepository::new(gateway, template()),
        }
    }

    /// Generic record operations.
    pub fn records(&self) -> &EntityRepository<Grade> {
        &self.records
    }

    /// Store `grade` under its `(lesson_id, student_id)` key.
    ///
    /// An existing grade for the same key keeps its id and gets the new
    /// value and comment; otherwise `grade` is inserted as is.
    pub async fn upsert(&self, grade: &Grade) -> AppResult<Grade> {
        let stored = self.records.find_or_create(grade, NATURAL_KEY).await?;
        if stored.id == grade.id
            || (stored.value == grade.value && stored.comment == grade.comment)
        {
            return Ok(stored);
        }

        debug!(
            id = %stored.id,
            lesson_id = %stored.lesson_id,
            student_id = %stored.student_id,
            "Updating existing grade"
        );
        let mut changed = stored;
        changed.value = grade.value;
        changed.comment = grade.comment.clone();
        self.records.update(&changed).await
    }

    /// Attach each grade's student.
    pub async fn load_student(&self, grades: &mut [Grade]) -> AppResult<()> {
        relation::load(&student_edge(), &self.students, grades.iter_mut()).await
    }

    /// Attach each grade's lesson.
    pub async fn load_lesson(&self, grades: &mut [Grade]) -> AppResult<()> {
        relation::load(&lesson_edge(), &self.lessons, grades.iter_mut()).await
    }
}

#[async_trait]
impl Repository<Grade, GradeFilter> for GradeRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Grade> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &GradeFilter) -> AppResult<Page<Grade>> {
        self.records.list(filter).await
    }

    async fn create(&self, grade: &Grade) -> AppResult<Grade> {
        self.records.create(grade).await
    }

    async fn update(&self, grade: &Grade) -> AppResult<Grade> {
        self.records.update(grade).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}
