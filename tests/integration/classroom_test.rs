//! Integration tests for classroom search, pagination and relation loading.

mod helpers;

use chrono::{Duration, Utc};

use schoolhub_core::traits::Repository;
use schoolhub_database::repositories::ClassroomFilter;
use schoolhub_entity::{Lesson, Subject, UserRole};

#[tokio::test]
async fn test_school_filter_sorted_page_with_total() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let s1 = t.create_school("S1", None).await;
    let s2 = t.create_school("S2", None).await;
    for name in ["11C", "10A", "10B"] {
        t.create_classroom(&s1.id, name).await;
    }
    for name in ["9A", "9B"] {
        t.create_classroom(&s2.id, name).await;
    }

    let filter = ClassroomFilter {
        school_id: Some(s1.id.clone()),
        sort: Some("name~".into()),
        limit: Some(2),
        offset: Some(0),
        ..Default::default()
    };
    let page = t.classrooms().list(&filter).await.expect("list");

    let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["10A", "10B"]);
    assert_eq!(page.total, 3);
    assert!(page.has_next());
    assert_eq!(filter.sort.as_deref(), Some("name~"));
}

#[tokio::test]
async fn test_descending_sort_and_page_past_end() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Sorted", None).await;
    for name in ["1A", "2A", "3A"] {
        t.create_classroom(&school.id, name).await;
    }
    let repo = t.classrooms();

    let descending = ClassroomFilter {
        school_id: Some(school.id.clone()),
        sort: Some("name".into()),
        ..Default::default()
    };
    let page = repo.list(&descending).await.expect("list");
    let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["3A", "2A", "1A"]);

    let past_end = ClassroomFilter {
        school_id: Some(school.id.clone()),
        limit: Some(2),
        offset: Some(10),
        ..Default::default()
    };
    let page = repo.list(&past_end).await.expect("list");
    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
    assert_eq!(page.offset, 10);
}

#[tokio::test]
async fn test_natural_default_order() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Natural", None).await;
    for name in ["10A", "9B", "9A", "11A"] {
        t.create_classroom(&school.id, name).await;
    }

    let filter = ClassroomFilter {
        school_id: Some(school.id.clone()),
        ..Default::default()
    };
    let page = t.classrooms().list(&filter).await.expect("list");
    let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["9A", "9B", "10A", "11A"]);
}

#[tokio::test]
async fn test_unknown_sort_field_is_rejected() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let filter = ClassroomFilter {
        sort: Some("password~".into()),
        ..Default::default()
    };
    let err = t.classrooms().list(&filter).await.unwrap_err();
    assert_eq!(err.kind, schoolhub_core::error::ErrorKind::Validation);
}

#[tokio::test]
async fn test_hydrated_list_and_teacher_filter() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let school = t.create_school("Hydrated", None).await;
    let teacher = t
        .create_user(Some(school.id.clone()), UserRole::Teacher)
        .await;
    let taught = t.create_classroom(&school.id, "7A").await;
    let other = t.create_classroom(&school.id, "7B").await;

    let mut algebra = Subject::new(&taught.id, "Algebra");
    algebra.teacher_id = Some(teacher.id.clone());
    let algebra = t.subjects().create(&algebra).await.expect("subject");
    t.subjects()
        .create(&Subject::new(&other.id, "History"))
        .await
        .expect("subject");

    let start = Utc::now() + Duration::days(1);
    for offset in [2, 0, 1] {
        let lesson = Lesson::new(
            &algebra.id,
            format!("Topic {offset}"),
            start + Duration::hours(offset),
            45,
        );
        t.lessons().create(&lesson).await.expect("lesson");
    }

    let by_teacher = ClassroomFilter {
        teacher_id: Some(teacher.id.clone()),
        ..Default::default()
    };
    let page = t.classrooms().list(&by_teacher).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, taught.id);

    let all = ClassroomFilter {
        school_id: Some(school.id.clone()),
        ..Default::default()
    };
    let page = t.classrooms().list_hydrated(&all).await.expect("hydrated");
    assert_eq!(page.items.len(), 2);
    for classroom in &page.items {
        assert_eq!(classroom.school.as_ref().map(|s| &s.id), Some(&school.id));
        assert_eq!(classroom.subjects.len(), 1);
    }

    let lessons = &page.items[0].subjects[0].lessons;
    let topics: Vec<_> = lessons.iter().map(|l| l.topic.as_str()).collect();
    assert_eq!(topics, ["Topic 0", "Topic 1", "Topic 2"]);
    assert!(page.items[1].subjects[0].lessons.is_empty());
}

#[tokio::test]
async fn test_empty_page_loads_no_relations() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let filter = ClassroomFilter {
        ids: Some(Vec::new()),
        ..Default::default()
    };
    let page = t.classrooms().list_hydrated(&filter).await.expect("list");
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}
