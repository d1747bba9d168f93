//! Pagination accumulator properties

use proptest::prelude::*;
use rotator_core::{CollectionId, InMemoryCollections, RemoteCall};
use rotator_engine::commands::fetch::fetch_all;

const MAIN: CollectionId = CollectionId(100);

fn ids(svc: &InMemoryCollections, page_size: usize) -> Vec<u64> {
    fetch_all(svc, MAIN, page_size)
        .unwrap()
        .into_iter()
        .map(|e| e.post_id.0)
        .collect()
}

#[test]
fn test_untruncated_first_page_returned_unmodified() {
    let svc = InMemoryCollections::new().with_collection(MAIN, [30, 10, 20]);

    assert_eq!(ids(&svc, 200), vec![30, 10, 20]);
    assert_eq!(svc.calls().len(), 1);
}

#[test]
fn test_cursor_from_previous_page_is_sent() {
    let svc = InMemoryCollections::new().with_collection(MAIN, 1..=5);

    fetch_all(&svc, MAIN, 2).unwrap();

    let cursors: Vec<Option<u64>> = svc
        .calls()
        .into_iter()
        .map(|call| match call {
            RemoteCall::FetchPage { cursor, .. } => cursor.map(|c| c.0),
            other => panic!("unexpected call {:?}", other),
        })
        .collect();
    assert_eq!(cursors, vec![None, Some(2), Some(4)]);
}

#[test]
fn test_error_on_later_page_discards_everything() {
    let svc = InMemoryCollections::new().with_collection(MAIN, 1..=10);
    svc.fail_pages_after(MAIN, 2);

    let err = fetch_all(&svc, MAIN, 3).unwrap_err();

    assert_eq!(err.code(), "ERR_TRANSPORT");
    assert_eq!(err.collection_id(), Some(MAIN));
}

#[test]
fn test_empty_collection() {
    let svc = InMemoryCollections::new().with_collection(MAIN, Vec::<u64>::new());
    assert!(ids(&svc, 200).is_empty());
}

proptest! {
    #[test]
    fn prop_pages_concatenate_in_order(
        posts in prop::collection::btree_set(1u64..10_000, 0..120),
        page_size in 1usize..25,
    ) {
        let posts: Vec<u64> = posts.into_iter().collect();
        let svc = InMemoryCollections::new().with_collection(MAIN, posts.clone());

        prop_assert_eq!(ids(&svc, page_size), posts.clone());

        let expected_pages = posts.len().div_ceil(page_size).max(1);
        prop_assert_eq!(svc.calls().len(), expected_pages);
    }

    #[test]
    fn prop_fetch_is_repeatable(
        posts in prop::collection::vec(1u64..10_000, 0..60),
        page_size in 1usize..10,
    ) {
        let svc = InMemoryCollections::new().with_collection(MAIN, posts);
        prop_assert_eq!(ids(&svc, page_size), ids(&svc, page_size));
    }
}
