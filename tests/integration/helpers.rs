//! Shared test helpers for integration tests.
//!
//! The tests need a PostgreSQL database given by
//! `SCHOOLHUB_TEST_DATABASE_URL`. When it is not set every test returns
//! early. Tests never truncate tables; each one works on rows with fresh
//! ids so they can run in parallel against the same database.

#![allow(dead_code)]

use schoolhub_core::config::{DatabaseConfig, SessionPolicy};
use schoolhub_core::traits::Repository;
use schoolhub_database::repositories::{
    ClassroomRepository, GradeRepository, LessonRepository, NotificationRepository,
    SchoolRepository, SubjectRepository, UserRepository,
};
use schoolhub_database::{DatabasePool, Gateway};
use schoolhub_entity::{Classroom, School, User, UserRole};

/// Environment variable holding the test database URL.
pub const DATABASE_URL_VAR: &str = "SCHOOLHUB_TEST_DATABASE_URL";

/// Connected, migrated test database.
pub struct TestDb {
    /// Pool wrapper, for direct queries.
    pub db: DatabasePool,
    /// Gateway used by the repositories.
    pub gateway: Gateway,
}

impl TestDb {
    /// Connect and migrate, or `None` when no test database is configured.
    pub async fn connect() -> Option<Self> {
        Self::connect_with(5).await
    }

    /// Like [`TestDb::connect`], with a pool of at most `max_connections`.
    pub async fn connect_with(max_connections: u32) -> Option<Self> {
        let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
            eprintln!("{DATABASE_URL_VAR} not set, skipping database test");
            return None;
        };

        let config = DatabaseConfig {
            url,
            max_connections,
            min_connections: 0,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 60,
            session_policy: SessionPolicy::ByIntent,
        };
        let db = DatabasePool::connect(&config)
            .await
            .expect("Failed to connect to test database");
        schoolhub_database::migration::run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        let gateway = db.gateway();
        Some(Self { db, gateway })
    }

    pub fn schools(&self) -> SchoolRepository {
        SchoolRepository::new(self.gateway.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.gateway.clone())
    }

    pub fn classrooms(&self) -> ClassroomRepository {
        ClassroomRepository::new(self.gateway.clone())
    }

    pub fn subjects(&self) -> SubjectRepository {
        SubjectRepository::new(self.gateway.clone())
    }

    pub fn lessons(&self) -> LessonRepository {
        LessonRepository::new(self.gateway.clone())
    }

    pub fn grades(&self) -> GradeRepository {
        GradeRepository::new(self.gateway.clone())
    }

    pub fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.gateway.clone())
    }

    /// Insert a school with a unique name.
    pub async fn create_school(&self, name: &str, parent_id: Option<String>) -> School {
        let school = School::new(format!("{name} {}", short_id()), parent_id);
        self.schools()
            .create(&school)
            .await
            .expect("Failed to create school")
    }

    /// Insert a classroom.
    pub async fn create_classroom(&self, school_id: &str, name: &str) -> Classroom {
        self.classrooms()
            .create(&Classroom::new(school_id, name))
            .await
            .expect("Failed to create classroom")
    }

    /// Insert a user with the given role.
    pub async fn create_user(&self, school_id: Option<String>, role: UserRole) -> User {
        let user = User::new(school_id, role, "Test", format!("User {}", short_id()));
        self.users()
            .create(&user)
            .await
            .expect("Failed to create user")
    }
}

/// Short unique suffix for names.
pub fn short_id() -> String {
    schoolhub_entity::new_id()[..8].to_string()
}
