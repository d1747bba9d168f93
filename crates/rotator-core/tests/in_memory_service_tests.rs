//! Behaviour of the in-memory collection host that the engine tests rely on

use rotator_core::{
    CollectionId, CollectionService, Entry, InMemoryCollections, PostId, RemoteCall,
    RotatorError,
};

const MAIN: CollectionId = CollectionId(100);
const BACKUP: CollectionId = CollectionId(200);

#[test]
fn test_add_appends_to_tail() {
    let svc = InMemoryCollections::new()
        .with_collection(MAIN, [1, 2])
        .with_collection(BACKUP, [9]);

    svc.add_entry(BACKUP, PostId(1)).unwrap();
    svc.add_entry(BACKUP, PostId(2)).unwrap();

    assert_eq!(svc.entries(BACKUP), vec![PostId(9), PostId(1), PostId(2)]);
}

#[test]
fn test_calls_are_recorded_in_order() {
    let svc = InMemoryCollections::new().with_collection(MAIN, [1]);

    svc.fetch_page(MAIN, None, 200).unwrap();
    svc.retweet(PostId(1)).unwrap();
    svc.remove_entry(MAIN, PostId(1)).unwrap();

    assert_eq!(
        svc.calls(),
        vec![
            RemoteCall::FetchPage {
                collection: MAIN,
                cursor: None
            },
            RemoteCall::Retweet { post: PostId(1) },
            RemoteCall::RemoveEntry {
                collection: MAIN,
                post: PostId(1)
            },
        ]
    );
}

#[test]
fn test_injected_retweet_failure() {
    let svc = InMemoryCollections::new().with_collection(MAIN, [1]);
    svc.fail_retweet(1);

    let err = svc.retweet(PostId(1)).unwrap_err();
    assert!(err.is_semantic());
    assert!(!svc.is_retweeted(1));
}

#[test]
fn test_page_failure_after_limit() {
    let svc = InMemoryCollections::new().with_collection(MAIN, 1..=10);
    svc.fail_pages_after(MAIN, 1);

    let first = svc.fetch_page(MAIN, None, 4).unwrap();
    assert_eq!(first.entries.first(), Some(&Entry::new(PostId(1))));

    let second = svc.fetch_page(MAIN, first.next_cursor, 4);
    assert!(matches!(second, Err(RotatorError::Transport { .. })));
}

#[test]
fn test_unretweet_clears_state() {
    let svc = InMemoryCollections::new()
        .with_collection(MAIN, [4])
        .with_retweeted(4);

    assert!(svc.fetch_post(PostId(4)).unwrap().retweeted);
    svc.unretweet(PostId(4)).unwrap();
    assert!(!svc.fetch_post(PostId(4)).unwrap().retweeted);
}

#[test]
fn test_service_usable_through_reference() {
    fn head_of<S: CollectionService>(svc: S) -> Option<PostId> {
        svc.fetch_page(MAIN, None, 1)
            .ok()
            .and_then(|p| p.entries.first().map(|e| e.post_id))
    }

    let svc = InMemoryCollections::new().with_collection(MAIN, [8, 9]);
    assert_eq!(head_of(&svc), Some(PostId(8)));
}
