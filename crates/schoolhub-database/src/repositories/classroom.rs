//! Classroom repository implementation.

use async_trait::async_trait;
use serde::Deserialize;

use schoolhub_core::result::AppResult;
use schoolhub_core::traits::Repository;
use schoolhub_core::types::{Page, PageRequest};
use schoolhub_entity::{Classroom, Lesson, School, Subject};

use crate::connection::Gateway;
use crate::filter::{ArgList, Clause, FilterSpec};
use crate::record::Record;
use crate::relation::{self, PgRelation, RelationEdge};
use crate::repository::EntityRepository;
use crate::template::QueryTemplate;

use super::{lesson, subject};

/// Grade number first (`9B` before `10A`), then the full name.
const NATURAL_ORDER: &str =
    "LPAD(SUBSTRING(classrooms.name FROM '^[0-9]+'), 10, '0') ASC, classrooms.name ASC";

impl Record for Classroom {
    const ENTITY: &'static str = "Classroom";
    const TABLE: &'static str = "classrooms";
    const COLUMNS: &'static [&'static str] =
        &["id", "school_id", "name", "created_at", "updated_at"];
    const WRITABLE: &'static [&'static str] = &["school_id", "name"];

    fn id(&self) -> &str {
        &self.id
    }

    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()> {
        args.push(self.school_id.clone())?;
        args.push(self.name.clone())?;
        Ok(())
    }
}

/// Search filter for classrooms.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassroomFilter {
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub school_id: Option<String>,
    pub school_ids: Option<Vec<String>>,
    /// Classrooms with at least one subject taught by this teacher.
    pub teacher_id: Option<String>,
    /// Matches the classroom name or the school name.
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FilterSpec for ClassroomFilter {
    fn apply(&self, clause: &mut Clause) -> AppResult<()> {
        clause.eq_opt("classrooms.id", self.id.clone())?;
        clause.any_opt("classrooms.id", self.ids.clone(), "text")?;
        clause.eq_opt("classrooms.school_id", self.school_id.clone())?;
        clause.any_opt("classrooms.school_id", self.school_ids.clone(), "text")?;
        if let Some(teacher_id) = &self.teacher_id {
            let n = clause.bind(teacher_id.clone())?;
            clause.raw(format!(
                "EXISTS (SELECT 1 FROM subjects WHERE subjects.classroom_id = classrooms.id \
                 AND subjects.teacher_id = ${n})"
            ));
        }
        if let Some(search) = &self.search {
            clause.contains(&["classrooms.name", "schools.name"], search)?;
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

/// Select description for classroom lists.
pub fn template() -> QueryTemplate {
    QueryTemplate::for_record::<Classroom>()
        .join("INNER JOIN schools ON schools.id = classrooms.school_id")
        .sortable("name", "classrooms.name")
        .sortable("school", "schools.name")
        .sortable("created_at", "classrooms.created_at")
        .default_order(NATURAL_ORDER)
}

/// Select description for classrooms loaded as a relation.
pub(crate) fn related_template() -> QueryTemplate {
    QueryTemplate::for_record::<Classroom>().default_order(NATURAL_ORDER)
}

fn school_edge() -> RelationEdge<Classroom, School> {
    RelationEdge::one(
        "school",
        |c| Some(c.school_id.clone()),
        |c, school| c.school = Some(Box::new(school)),
    )
}

fn subjects_edge() -> RelationEdge<Classroom, Subject> {
    RelationEdge::many("subjects", |c| Some(c.id.clone()), |c| &mut c.subjects)
}

/// Repository for classrooms.
#[derive(Debug, Clone)]
pub struct ClassroomRepository {
    records: EntityRepository<Classroom>,
    schools: PgRelation<School>,
    subjects: PgRelation<Subject>,
    lessons: PgRelation<Lesson>,
}

impl ClassroomRepository {
    /// Create a new classroom repository.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            schools: PgRelation::new(
                gateway.clone(),
                QueryTemplate::for_record::<School>(),
                "schools.id",
            ),
            subjects: PgRelation::new(
                gateway.clone(),
                subject::related_template(),
                "subjects.classroom_id",
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
    pub fn records(&self) -> &EntityRepository<Classroom> {
        &self.records
    }

    /// Attach each classroom's school.
    pub async fn load_school(&self, classrooms: &mut [Classroom]) -> AppResult<()> {
        relation::load(&school_edge(), &self.schools, classrooms.iter_mut()).await
    }

    /// Attach subjects, and optionally each subject's lessons.
    pub async fn load_subjects(
        &self,
        classrooms: &mut [Classroom],
        with_lessons: bool,
    ) -> AppResult<()> {
        relation::load(&subjects_edge(), &self.subjects, classrooms.iter_mut()).await?;
        if with_lessons {
            self.load_lessons(classrooms).await?;
        }
        Ok(())
    }

    async fn load_lessons(&self, classrooms: &mut [Classroom]) -> AppResult<()> {
        relation::load(
            &subject::lessons_edge(),
            &self.lessons,
            classrooms.iter_mut().flat_map(|c| c.subjects.iter_mut()),
        )
        .await
    }

    /// List classrooms with school, subjects and lessons attached.
    ///
    /// School and subjects are fetched concurrently; lessons follow once
    /// the subjects are in place. Three queries at most, whatever the
    /// page size.
    pub async fn list_hydrated(&self, filter: &ClassroomFilter) -> AppResult<Page<Classroom>> {
        let mut page = self.records.list(filter).await?;
        let school = school_edge();
        let subjects = subjects_edge();

        let (school_rows, subject_rows) = tokio::try_join!(
            relation::prefetch(&school, &self.schools, page.items.iter()),
            relation::prefetch(&subjects, &self.subjects, page.items.iter()),
        )?;
        school.stitch(page.items.iter_mut(), school_rows);
        subjects.stitch(page.items.iter_mut(), subject_rows);

        self.load_lessons(&mut page.items).await?;
        Ok(page)
    }
}

#[async_trait]
impl Repository<Classroom, ClassroomFilter> for ClassroomRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Classroom> {
        self.records.find_by_id(id).await
    }

    async fn list(&self, filter: &ClassroomFilter) -> AppResult<Page<Classroom>> {
        self.records.list(filter).await
    }

    async fn create(&self, classroom: &Classroom) -> AppResult<Classroom> {
        self.records.create(classroom).await
    }

    async fn update(&self, classroom: &Classroom) -> AppResult<Classroom> {
        self.records.update(classroom).await
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.records.delete(id).await
    }
}
