use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use mblog_store::domain::content::{ContentKind, NewContent};
use mblog_store::domain::types::ContentId;
use mblog_store::error::RepositoryError;
use mblog_store::events::{StoreEvent, Topic};
use mblog_store::repository::{
    CategoryReader, ContentReader, ContentWriter, ProfileReader, StoreRepository,
};
use mblog_store::storage::{KeyValueStore, MemoryStore};

mod common;

fn id(raw: i64) -> ContentId {
    ContentId::new(raw).expect("valid id")
}

fn add<S: KeyValueStore>(repo: &StoreRepository<S>, kind: ContentKind, title: &str) {
    repo.create_content(kind, &NewContent::new(title, "Tech"))
        .expect("create content");
}

#[test]
fn add_to_empty_concepts_yields_first_record() {
    let test_db = common::TestDb::new();
    let repo = common::sqlite_repository(&test_db);

    let record = repo
        .create_content(ContentKind::Concept, &NewContent::new("X", "Tech"))
        .unwrap();

    assert_eq!(record.id, 1);
    assert_eq!(record.views, 0);
    assert_eq!(record.likes, 0);
    assert_eq!(record.comments, 0);
    assert_eq!(record.created_at, Utc::now().date_naive());
    assert_eq!(repo.list_content(ContentKind::Concept).unwrap(), vec![record]);
}

#[test]
fn add_grows_collection_with_max_plus_one_id() {
    let repo = common::memory_repository(MemoryStore::new());
    for kind in ContentKind::ALL {
        add(&repo, kind, "A");
        add(&repo, kind, "B");
        repo.delete_content(kind, id(1)).unwrap();

        let before = repo.list_content(kind).unwrap();
        let max_id = before.iter().map(|r| r.id.get()).max().unwrap_or(0);
        add(&repo, kind, "C");
        let after = repo.list_content(kind).unwrap();

        assert_eq!(after.len(), before.len() + 1, "{kind}");
        assert!(after.iter().any(|r| r.id.get() == max_id + 1), "{kind}");
    }
}

#[test]
fn reorder_moves_first_infographic_to_the_end() {
    let test_db = common::TestDb::new();
    let repo = common::sqlite_repository(&test_db);
    for title in ["A", "B", "C"] {
        add(&repo, ContentKind::Infographic, title);
    }

    repo.reorder_content(ContentKind::Infographic, 0, 2).unwrap();

    let listed: Vec<(String, Option<u32>)> = repo
        .list_content(ContentKind::Infographic)
        .unwrap()
        .into_iter()
        .map(|r| (r.title.into_inner(), r.order))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("B".to_string(), Some(1)),
            ("C".to_string(), Some(2)),
            ("A".to_string(), Some(3)),
        ]
    );
}

#[test]
fn every_reorder_keeps_order_dense() {
    let repo = common::memory_repository(MemoryStore::new());
    for title in ["A", "B", "C", "D", "E"] {
        add(&repo, ContentKind::Favorite, title);
    }

    for (from, to) in [(0, 4), (4, 0), (1, 3), (3, 3), (2, 0), (4, 1)] {
        let before = repo.list_content(ContentKind::Favorite).unwrap();
        repo.reorder_content(ContentKind::Favorite, from, to).unwrap();
        let after = repo.list_content(ContentKind::Favorite).unwrap();

        let mut orders: Vec<u32> = after.iter().filter_map(|r| r.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
        assert_eq!(after[to].id, before[from].id);
    }

    assert_eq!(
        repo.reorder_content(ContentKind::Favorite, 5, 0),
        Err(RepositoryError::IndexOutOfRange { index: 5, len: 5 })
    );
}

#[test]
fn legacy_records_without_order_are_backfilled_once() {
    let store = MemoryStore::new();
    store
        .set_item(
            ContentKind::Infographic.storage_key(),
            r#"[
                {"id": 4, "title": "Late", "createdAt": "2024-01-03", "order": 1},
                {"id": 2, "title": "Legacy", "createdAt": "2024-01-01"}
            ]"#,
        )
        .unwrap();
    let repo = common::memory_repository(store);

    let first = repo.list_content(ContentKind::Infographic).unwrap();
    let writes = repo.adapter().store().write_count();
    let second = repo.list_content(ContentKind::Infographic).unwrap();

    assert_eq!(first, second);
    assert_eq!(first[1].order, Some(2));
    assert_eq!(repo.adapter().store().write_count(), writes);
}

#[test]
fn like_toggle_law_holds_for_every_kind() {
    let repo = common::memory_repository(MemoryStore::new());
    for kind in ContentKind::ALL {
        add(&repo, kind, "A");
        let before = repo.get_content_by_id(kind, id(1)).unwrap().unwrap();
        let liked_before = repo.is_liked(kind, id(1)).unwrap();

        repo.toggle_like(kind, id(1)).unwrap();
        repo.toggle_like(kind, id(1)).unwrap();

        let after = repo.get_content_by_id(kind, id(1)).unwrap().unwrap();
        assert_eq!(after.likes, before.likes, "{kind}");
        assert_eq!(repo.is_liked(kind, id(1)).unwrap(), liked_before, "{kind}");
    }
}

#[test]
fn reset_stats_is_idempotent() {
    let test_db = common::TestDb::new();
    let repo = common::sqlite_repository(&test_db);
    add(&repo, ContentKind::Resource, "A");
    add(&repo, ContentKind::Resource, "B");
    repo.record_download(ContentKind::Resource, id(1)).unwrap();
    repo.toggle_like(ContentKind::Resource, id(2)).unwrap();

    repo.reset_stats(ContentKind::Resource).unwrap();
    let once = repo.list_content(ContentKind::Resource).unwrap();
    repo.reset_stats(ContentKind::Resource).unwrap();
    let twice = repo.list_content(ContentKind::Resource).unwrap();

    assert_eq!(once, twice);
    assert!(once.iter().all(|r| r.downloads == 0 && r.likes == 0));
    assert!(!repo.is_liked(ContentKind::Resource, id(2)).unwrap());
}

#[test]
fn missing_ids_are_reported_not_raised() {
    let repo = common::memory_repository(MemoryStore::new());
    add(&repo, ContentKind::Article, "A");

    assert_eq!(
        repo.update_content(ContentKind::Article, id(7), &Default::default())
            .unwrap(),
        None
    );
    assert!(!repo.delete_content(ContentKind::Article, id(7)).unwrap());
    assert!(!repo.record_view(ContentKind::Article, id(7)).unwrap());
    assert_eq!(repo.toggle_like(ContentKind::Article, id(7)).unwrap(), None);
    assert_eq!(repo.list_content(ContentKind::Article).unwrap().len(), 1);
}

#[test]
fn every_write_notifies_specific_and_generic_topics() {
    let repo = common::memory_repository(MemoryStore::new());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    repo.bus().subscribe(Topic::Content(ContentKind::Tutorial), move |event| {
        sink.borrow_mut().push(format!("tutorials:{}", matches!(event, StoreEvent::Updated { .. })))
    });
    let sink = Rc::clone(&seen);
    let generic = repo.bus().subscribe(Topic::StorageChanged, move |event| {
        sink.borrow_mut().push(format!("changed:{}", event.key()))
    });

    add(&repo, ContentKind::Tutorial, "A");
    repo.record_view(ContentKind::Tutorial, id(1)).unwrap();
    repo.bus().unsubscribe(generic);
    repo.record_view(ContentKind::Tutorial, id(1)).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            "tutorials:true",
            "changed:mblog_tutorials",
            "tutorials:true",
            "changed:mblog_tutorials",
            "tutorials:true",
        ]
    );
}

#[test]
fn singletons_and_categories_persist_across_repositories() {
    let test_db = common::TestDb::new();
    let first = common::sqlite_repository(&test_db);
    let profile = first.get_profile().unwrap();
    let categories = first.list_categories().unwrap();

    let second = common::sqlite_repository(&test_db);
    assert_eq!(second.get_profile().unwrap(), profile);
    assert_eq!(second.list_categories().unwrap(), categories);
}
