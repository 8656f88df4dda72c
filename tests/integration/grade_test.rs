//! Integration tests for grade upserts and relation loading.

mod helpers;

use std::collections::HashSet;

use chrono::Utc;

use schoolhub_core::traits::Repository;
use schoolhub_database::repositories::GradeFilter;
use schoolhub_entity::{Grade, Lesson, Subject, UserRole};

async fn seed_lesson(t: &helpers::TestDb) -> (Lesson, String) {
    let school = t.create_school("Grades", None).await;
    let classroom = t.create_classroom(&school.id, "8A").await;
    let subject = t
        .subjects()
        .create(&Subject::new(&classroom.id, "Physics"))
        .await
        .expect("subject");
    let lesson = t
        .lessons()
        .create(&Lesson::new(&subject.id, "Optics", Utc::now(), 45))
        .await
        .expect("lesson");
    let student = t
        .create_user(Some(school.id.clone()), UserRole::Student)
        .await;
    (lesson, student.id)
}

#[tokio::test]
async fn test_upsert_keeps_existing_id_and_updates_value() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let (lesson, student_id) = seed_lesson(&t).await;
    let grades = t.grades();

    let first = grades
        .upsert(&Grade::new(&lesson.id, &student_id, 3))
        .await
        .expect("insert");
    assert_eq!(first.value, 3);

    let mut retry = Grade::new(&lesson.id, &student_id, 5);
    retry.comment = Some("Retake".into());
    let second = grades.upsert(&retry).await.expect("upsert");

    assert_eq!(second.id, first.id);
    assert_eq!(second.value, 5);
    assert_eq!(second.comment.as_deref(), Some("Retake"));

    let filter = GradeFilter {
        lesson_id: Some(lesson.id.clone()),
        ..Default::default()
    };
    let page = grades.list(&filter).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].value, 5);
}

#[tokio::test]
async fn test_upsert_same_value_is_unchanged() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let (lesson, student_id) = seed_lesson(&t).await;
    let grades = t.grades();

    let first = grades
        .upsert(&Grade::new(&lesson.id, &student_id, 4))
        .await
        .expect("insert");
    let again = grades
        .upsert(&Grade::new(&lesson.id, &student_id, 4))
        .await
        .expect("upsert");

    assert_eq!(again.id, first.id);
    assert_eq!(again.updated_at, first.updated_at);
}

#[tokio::test]
async fn test_concurrent_upserts_share_one_row() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let (lesson, student_id) = seed_lesson(&t).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let grades = t.grades();
            let grade = Grade::new(&lesson.id, &student_id, 4);
            tokio::spawn(async move { grades.upsert(&grade).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let stored = handle.await.expect("join").expect("upsert");
        ids.insert(stored.id);
    }
    assert_eq!(ids.len(), 1);

    let filter = GradeFilter {
        lesson_id: Some(lesson.id.clone()),
        student_id: Some(student_id.clone()),
        ..Default::default()
    };
    assert_eq!(t.grades().list(&filter).await.expect("list").total, 1);
}

#[tokio::test]
async fn test_load_student_and_lesson() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let (lesson, student_id) = seed_lesson(&t).await;
    let grades = t.grades();
    grades
        .upsert(&Grade::new(&lesson.id, &student_id, 5))
        .await
        .expect("insert");

    let filter = GradeFilter {
        student_id: Some(student_id.clone()),
        ..Default::default()
    };
    let mut items = grades.list(&filter).await.expect("list").items;
    grades.load_student(&mut items).await.expect("student");
    grades.load_lesson(&mut items).await.expect("lesson");

    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].student.as_ref().map(|u| u.id.as_str()),
        Some(student_id.as_str())
    );
    assert_eq!(
        items[0].lesson.as_ref().map(|l| l.topic.as_str()),
        Some("Optics")
    );
}
