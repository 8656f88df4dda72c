//! Integration tests for generic record operations.

mod helpers;

use schoolhub_core::error::ErrorKind;
use schoolhub_core::traits::Repository;
use schoolhub_database::repositories::{ClassroomFilter, UserFilter};
use schoolhub_entity::{Classroom, User, UserRole};

#[tokio::test]
async fn test_create_then_find_round_trip() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Round Trip", None).await;
    let mut user = User::new(Some(school.id.clone()), UserRole::Student, "Aziza", "Karimova");
    user.phone = Some("+998901234567".into());
    user.email = Some(format!("{}@example.com", helpers::short_id()));

    let created = t.users().create(&user).await.expect("create");
    let found = t.users().find_by_id(&user.id).await.expect("find");

    assert_eq!(created.id, user.id);
    assert_eq!(found.id, user.id);
    assert_eq!(found.school_id, user.school_id);
    assert_eq!(found.role, UserRole::Student);
    assert_eq!(found.first_name, "Aziza");
    assert_eq!(found.last_name, "Karimova");
    assert_eq!(found.phone, user.phone);
    assert_eq!(found.email, user.email);
    assert!(found.school.is_none());
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Update", None).await;
    let mut classroom = t.create_classroom(&school.id, "5A").await;
    classroom.name = "5B".into();

    let first = t.classrooms().update(&classroom).await.expect("update");
    let second = t.classrooms().update(&classroom).await.expect("update");
    let stored = t.classrooms().find_by_id(&classroom.id).await.expect("find");

    assert_eq!(first.name, "5B");
    assert_eq!(first, second);
    assert_eq!(second, stored);
}

#[tokio::test]
async fn test_update_with_changes_bumps_updated_at() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Touch", None).await;
    let created = t.create_classroom(&school.id, "4A").await;

    let mut renamed = created.clone();
    renamed.name = "4B".into();
    let updated = t.classrooms().update(&renamed).await.expect("update");

    assert_eq!(updated.name, "4B");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn test_zero_limit_returns_only_total() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Zero", None).await;
    for name in ["1A", "1B", "1C"] {
        t.create_classroom(&school.id, name).await;
    }

    let filter = ClassroomFilter {
        school_id: Some(school.id.clone()),
        limit: Some(0),
        ..Default::default()
    };
    let page = t.classrooms().list(&filter).await.expect("list");
    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
    assert_eq!(page.limit, 0);
}

#[tokio::test]
async fn test_huge_offset_is_validation_error() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let filter = ClassroomFilter {
        offset: Some(u64::MAX),
        ..Default::default()
    };
    let err = t.classrooms().list(&filter).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_released_connection_accepts_direct_writes() {
    let Some(t) = helpers::TestDb::connect_with(1).await else {
        return;
    };
    let school = t.create_school("Session", None).await;
    t.schools().find_by_id(&school.id).await.expect("read");

    let id = schoolhub_entity::new_id();
    sqlx::query("INSERT INTO schools (id, name) VALUES ($1, $2)")
        .bind(&id)
        .bind(format!("Direct {}", helpers::short_id()))
        .execute(t.db.pool())
        .await
        .expect("direct write after a read operation");

    let stored = t.schools().find_by_id(&id).await.expect("find");
    assert!(stored.is_root());
}

#[tokio::test]
async fn test_missing_id_is_not_found() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let missing = schoolhub_entity::new_id();

    let err = t.users().find_by_id(&missing).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(err.message.contains(&missing));

    let ghost = Classroom::new("nowhere", "0A");
    let err = t.classrooms().update(&ghost).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let found = t.users().records().find_optional(&missing).await.expect("find");
    assert!(found.is_none());
}

#[tokio::test]
async fn test_delete_reports_whether_a_row_was_removed() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Delete", None).await;
    let classroom = t.create_classroom(&school.id, "6A").await;

    assert!(t.classrooms().delete(&classroom.id).await.expect("delete"));
    assert!(!t.classrooms().delete(&classroom.id).await.expect("delete"));
}

#[tokio::test]
async fn test_dangling_foreign_key_is_constraint_violation() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let orphan = Classroom::new(schoolhub_entity::new_id(), "1A");

    let err = t.classrooms().create(&orphan).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConstraintViolation);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_user_search_and_role_filter() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Search", None).await;
    let marker = helpers::short_id();
    let teacher = User::new(Some(school.id.clone()), UserRole::Teacher, "Dilshod", marker.clone());
    let student = User::new(Some(school.id.clone()), UserRole::Student, "Dilnoza", marker.clone());
    t.users().create(&teacher).await.expect("create");
    t.users().create(&student).await.expect("create");

    let filter = UserFilter {
        search: Some(format!("  {marker} ")),
        role: Some(UserRole::Teacher),
        ..Default::default()
    };
    let page = t.users().list_with_school(&filter).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, teacher.id);
    assert_eq!(
        page.items[0].school.as_ref().map(|s| s.id.as_str()),
        Some(school.id.as_str())
    );

    let wildcard = UserFilter {
        school_id: Some(school.id.clone()),
        search: Some("%".into()),
        ..Default::default()
    };
    let page = t.users().list(&wildcard).await.expect("list");
    assert_eq!(page.total, 0);
}
