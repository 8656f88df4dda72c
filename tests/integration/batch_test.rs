//! Integration tests for batch execution.

mod helpers;

use schoolhub_core::error::ErrorKind;
use schoolhub_core::traits::Repository;
use schoolhub_database::repositories::ClassroomFilter;
use schoolhub_entity::{Classroom, Notification, UserRole};

#[tokio::test]
async fn test_create_many_stops_at_first_failure() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Batch", None).await;
    let rooms = vec![
        Classroom::new(&school.id, "1A"),
        Classroom::new(schoolhub_entity::new_id(), "1B"),
        Classroom::new(&school.id, "1C"),
    ];

    let err = t
        .classrooms()
        .records()
        .create_many(&rooms)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConstraintViolation);
    assert!(
        err.message.contains("batch item 1 of 3 failed after 1 applied"),
        "unexpected message: {}",
        err.message
    );

    let filter = ClassroomFilter {
        school_id: Some(school.id.clone()),
        ..Default::default()
    };
    let page = t.classrooms().list(&filter).await.expect("list");
    let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["1A"]);
}

#[tokio::test]
async fn test_atomic_batch_rolls_back_everything() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Atomic", None).await;
    let rooms = vec![
        Classroom::new(&school.id, "2A"),
        Classroom::new(&school.id, "2B"),
        Classroom::new(schoolhub_entity::new_id(), "2C"),
    ];

    let err = t
        .classrooms()
        .records()
        .create_many_atomic(&rooms)
        .await
        .unwrap_err();
    assert!(err.message.contains("batch item 2 of 3"));

    let filter = ClassroomFilter {
        school_id: Some(school.id.clone()),
        ..Default::default()
    };
    assert_eq!(t.classrooms().records().count(&filter).await.expect("count"), 0);
}

#[tokio::test]
async fn test_create_many_reports_rows_per_statement() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Report", None).await;
    let rooms: Vec<_> = ["3A", "3B", "3C"]
        .into_iter()
        .map(|name| Classroom::new(&school.id, name))
        .collect();

    let report = t
        .classrooms()
        .records()
        .create_many(&rooms)
        .await
        .expect("batch");
    assert_eq!(report.rows_affected, [1, 1, 1]);
    assert_eq!(report.total_rows(), 3);

    let empty = t
        .classrooms()
        .records()
        .create_many(&[])
        .await
        .expect("empty batch");
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_mark_read_many() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let user = t.create_user(None, UserRole::Parent).await;
    let notifications = t.notifications();
    let mut ids = Vec::new();
    for title in ["Homework", "Meeting", "Invoice"] {
        let n = notifications
            .create(&Notification::new(&user.id, title, "Details"))
            .await
            .expect("create");
        ids.push(n.id);
    }

    assert!(notifications.mark_read(&ids[0]).await.expect("mark"));
    assert!(!notifications.mark_read(&ids[0]).await.expect("mark"));

    let report = notifications.mark_read_many(&ids).await.expect("batch");
    assert_eq!(report.rows_affected, [0, 1, 1]);

    for id in &ids {
        let n = notifications.find_by_id(id).await.expect("find");
        assert!(n.is_read);
    }
}
