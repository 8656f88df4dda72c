//! Integration tests for school hierarchy loading and grouped sorting.

mod helpers;

use schoolhub_core::traits::Repository;
use schoolhub_database::repositories::SchoolFilter;

#[tokio::test]
async fn test_load_parents_walks_hierarchy() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let network = t.create_school("Network", None).await;
    let region = t.create_school("Region", Some(network.id.clone())).await;
    let branch = t.create_school("Branch", Some(region.id.clone())).await;
    let sibling = t.create_school("Sibling", Some(region.id.clone())).await;

    let schools = t.schools();
    let mut items = vec![
        schools.find_by_id(&branch.id).await.expect("find"),
        schools.find_by_id(&sibling.id).await.expect("find"),
    ];
    schools.load_parents(&mut items, 5).await.expect("parents");

    for school in &items {
        assert_eq!(
            school.lineage(),
            [school.name.as_str(), region.name.as_str(), network.name.as_str()]
        );
    }
}

#[tokio::test]
async fn test_load_parents_respects_depth() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let root = t.create_school("Root", None).await;
    let middle = t.create_school("Middle", Some(root.id.clone())).await;
    let leaf = t.create_school("Leaf", Some(middle.id.clone())).await;

    let mut items = vec![leaf];
    t.schools().load_parents(&mut items, 1).await.expect("parents");

    let parent = items[0].parent.as_deref().expect("parent loaded");
    assert_eq!(parent.id, middle.id);
    assert!(parent.parent.is_none());
}

#[tokio::test]
async fn test_sort_by_classroom_count() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let network = t.create_school("Counted", None).await;
    let small = t.create_school("Small", Some(network.id.clone())).await;
    let large = t.create_school("Large", Some(network.id.clone())).await;
    let empty = t.create_school("Empty", Some(network.id.clone())).await;
    t.create_classroom(&small.id, "1A").await;
    for name in ["1A", "1B", "1C"] {
        t.create_classroom(&large.id, name).await;
    }

    let filter = SchoolFilter {
        parent_id: Some(network.id.clone()),
        sort: Some("classrooms".into()),
        ..Default::default()
    };
    let page = t.schools().list(&filter).await.expect("list");
    let ids: Vec<_> = page.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, [large.id.as_str(), small.id.as_str(), empty.id.as_str()]);
    assert_eq!(page.total, 3);

    let mut items = page.items;
    t.schools().load_classrooms(&mut items).await.expect("classrooms");
    let counts: Vec<_> = items.iter().map(|s| s.classrooms.len()).collect();
    assert_eq!(counts, [3, 1, 0]);
}

#[tokio::test]
async fn test_root_filter() {
    let Some(t) = helpers::TestDb::connect().await else {
        return;
    };
    let root = t.create_school("Rooted", None).await;
    let branch = t.create_school("Branched", Some(root.id.clone())).await;

    let roots = SchoolFilter {
        ids: Some(vec![root.id.clone(), branch.id.clone()]),
        is_root: Some(true),
        ..Default::default()
    };
    let page = t.schools().list(&roots).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, root.id);
    assert!(page.items[0].is_root());

    let branches = SchoolFilter {
        is_root: Some(false),
        ..roots
    };
    let page = t.schools().list(&branches).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, branch.id);
}
