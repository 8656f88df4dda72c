//! Subject repository implementation.

use async_trait::async_trait;
use serde::Deserialize;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest};
use schoolhub_entity::{Lesson, Subject, User};

use crate::connection::Gateway;
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

use super::lesson;

impl Record for Subject {
    const ENTITY: &'static str = "Subject";
    const TABLE: &'static str = "subjects";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "classroom_id",
        "teacher_id",
        "name",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &["classroom_id", "teacher_id", "name"];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.classroom_id.clone())?;
        args.push(self.teacher_id.clone())?;
        args.push(self.name.clone())?;
        Ok(())
    }
}

/// Search filter for subjects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubjectFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub classroom_id: Option<String>,
    pub classroom_ids: Option<Vec<String>>,
    pub teacher_id: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for SubjectFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("subjects.id", self.id.clone())?;
        clause.any_opt("subjects.id", self.ids.clone(), "text")?;
        clause.eq_opt("subjects.classroom_id", self.classroom_id.clone())?;
        clause.any_opt("subjects.classroom_id", self.classroom_ids.clone(), "text")?;
        clause.eq_opt("subjects.teacher_id", self.teacher_id.clone())?;
        if let Some(search) = &self.search {
            clause.contains(&["subjects.name"], search)?;
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

/// Select description for subjects.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<Subject>()
        .sortable("name", "subjects.name")
        .sortable("created_at", "subjects.created_at")
        .default_order("subjects.name ASC")
}

pub(crate) fn related_template() -> QueryTemplate {
    QueryTemplate::for_record::<Subject>().default_order("subjects.name ASC")
}

fn teacher_edge() -> RelationEdge<Subject, User> {
    RelationEdge::one(
        "teacher",
        |s| s.teacher_id.clone(),
        |s, teacher| s.teacher = Some(Box::new(teacher)),
    )
}

pub(crate) fn lessons_edge() -> RelationEdge<Subject, Lesson> {
    RelationEdge::many("lessons", |s| Some(s.id.clone()), |s| &mut s.lessons)
}

/// Repository for subjects.
#[derive(Debug, Clone)]
pub struct SubjectRepository {
    records: EntityRepository<Subject>,
    teachers: PgRelation<User>,
    lessons: PgRelation<Lesson>,
}

impl SubjectRepository {
    /// Create a new subject repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            teachers: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<User>(),
                "users.id",
            ),
            lessons: PgRelation::new(
                gateway.clone(),
                lesson::related_template(),
                "lessons.subject_id",
            ),
            records: EntityRepository::new(gateway, template()),
        }
    }

    /// Generic record operations.
    pub fn records(&self) -> &EntityRepository<Subject> {
        &self.records
    }

    /// Attach each subject's teacher. Subjects without one are left as is.
    pub async fn load_teacher(&self, subjects: &mut [Subject]) -> AppResult<()> {
        relation::load(&teacher_edge(), &self.teachers, subjects.iter_mut()).await
    }

    /// Attach each subject's lessons in schedule order.
    pub async fn load_lessons(&self, subjects: &mut [Subject]) -> AppResult<()> {
        relation::load(&lessons_edge(), &self.lessons, subjects.iter_mut()).await
    }
}

#[async_trait]
impl Repository<Subject, SubjectFilter> for SubjectRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Subject> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &SubjectFilter) -> AppResult<Page<Subject>> {
        self.records.list(filter).await
    }

    async fn create(&self, subject: &Subject) -> AppResult<Subject> {
        self.records.create(subject).await
    }

    async fn update(&self, subject: &Subject) -> AppResult<Subject> {
        self.records.update(subject).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::compose;
    use crate::test_support::assert_record_schema;

    #[test]
    fn test_subject_record_schema() {
        assert_record_schema(&Subject::new("C1", "Algebra"));
    }

    #[test]
    fn test_teacher_key_skips_unassigned_subjects() {
        let mut assigned = Subject::new("C1", "Algebra");
        assigned.teacher_id = Some("T1".into());
        let unassigned = Subject::new("C1", "Physics");
        assert_eq!(teacher_edge().keys([&assigned, &unassigned]), ["T1"]);
    }

    #[test]
    fn test_filter_by_classrooms() {
        let filter = SubjectFilter {
            classroom_ids: Some(vec!["C1".into(), "C2".into()]),
            ..Default::default()
        };
        let clause = compose(&filter, Clause::new()).unwrap();
        assert_eq!(
            clause.where_sql(),
            " WHERE subjects.classroom_id = ANY($1::text[])"
        );
    }
}
