//! Queue rotation scenarios

use rotator_core::logging_facility::test_capture::init_test_capture;
use rotator_core::{CollectionId, InMemoryCollections, PostId, RemoteCall, RotatorError};
use tracing::Level;
use rotator_engine::commands::relocate::RelocationStage;
use rotator_engine::commands::rotate::{rotate, RotationOptions, RotationStatus};

const MAIN: CollectionId = CollectionId(1);
const BACKUP: CollectionId = CollectionId(2);

fn posts(ids: &[u64]) -> Vec<PostId> {
    ids.iter().copied().map(PostId).collect()
}

fn setup(main: &[u64], backup: &[u64]) -> InMemoryCollections {
    InMemoryCollections::new()
        .with_collection(MAIN, main.to_vec())
        .with_collection(BACKUP, backup.to_vec())
}

fn count_retweets(svc: &InMemoryCollections) -> usize {
    svc.count_calls(|c| matches!(c, RemoteCall::Retweet { .. }))
}

#[test]
fn test_head_promoted_and_moved_to_backup() {
    // Given: main [A, B, C] where A can be retweeted
    let svc = setup(&[11, 12, 13], &[]);

    // When
    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    // Then: A is promoted and sits in the backup
    assert_eq!(outcome.status, RotationStatus::Promoted(PostId(11)));
    assert_eq!(svc.entries(MAIN), posts(&[12, 13]));
    assert_eq!(svc.entries(BACKUP), posts(&[11]));
    assert!(svc.is_retweeted(11));

    // And: exactly one retweet and one remove+add pair were issued
    assert_eq!(count_retweets(&svc), 1);
    assert_eq!(
        svc.count_calls(|c| matches!(c, RemoteCall::RemoveEntry { .. })),
        1
    );
    assert_eq!(
        svc.count_calls(|c| matches!(c, RemoteCall::AddEntry { .. })),
        1
    );
    assert!(outcome.skipped.is_empty());
    assert!(outcome.refill.is_none());
}

#[test]
fn test_failed_head_is_skipped_once() {
    // Given: A's retweet fails, B's succeeds
    let svc = setup(&[11, 12, 13], &[]);
    svc.fail_retweet(11);

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    // Then: source [C], backup [A, B] in that order, one retry
    assert_eq!(outcome.status, RotationStatus::Promoted(PostId(12)));
    assert_eq!(svc.entries(MAIN), posts(&[13]));
    assert_eq!(svc.entries(BACKUP), posts(&[11, 12]));
    assert_eq!(outcome.retries(), 1);
    assert_eq!(outcome.skipped[0].post_id, PostId(11));
    assert_eq!(count_retweets(&svc), 2);
}

#[test]
fn test_already_retweeted_head_is_unretweeted_first() {
    let svc = setup(&[11, 12], &[]).with_retweeted(11);

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    assert_eq!(outcome.promoted(), Some(PostId(11)));
    let calls = svc.calls();
    let unretweet = calls
        .iter()
        .position(|c| *c == RemoteCall::Unretweet { post: PostId(11) })
        .unwrap();
    let retweet = calls
        .iter()
        .position(|c| *c == RemoteCall::Retweet { post: PostId(11) })
        .unwrap();
    assert!(unretweet < retweet);
    assert!(svc.is_retweeted(11));
}

#[test]
fn test_unfetchable_head_counts_as_failure() {
    let svc = setup(&[11, 12, 13], &[]);
    svc.fail_fetch_post(11);

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    assert_eq!(outcome.promoted(), Some(PostId(12)));
    assert_eq!(outcome.skipped[0].error.code(), "ERR_NOT_FOUND");
    assert_eq!(svc.entries(BACKUP), posts(&[11, 12]));
}

#[test]
fn test_single_entry_triggers_refill_before_promotion() {
    // Given: main holds one stray entry, backup holds two
    let svc = setup(&[11], &[21, 22]);

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    // Then: the backup was emptied into main before any retweet
    let refill = outcome.refill.as_ref().unwrap();
    assert_eq!(refill.moved, posts(&[21, 22]));

    let calls = svc.calls();
    let first_retweet = calls
        .iter()
        .position(|c| matches!(c, RemoteCall::Retweet { .. }))
        .unwrap();
    let last_refill_add = calls
        .iter()
        .rposition(|c| {
            matches!(c, RemoteCall::AddEntry { collection, .. } if *collection == MAIN)
        })
        .unwrap();
    assert!(last_refill_add < first_retweet);

    // And: the original head is promoted
    assert_eq!(outcome.promoted(), Some(PostId(11)));
    assert_eq!(svc.entries(MAIN), posts(&[21, 22]));
    assert_eq!(svc.entries(BACKUP), posts(&[11]));
}

#[test]
fn test_nothing_to_promote_when_both_empty() {
    let svc = setup(&[], &[]);

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    assert_eq!(outcome.status, RotationStatus::NothingToPromote);
    assert_eq!(count_retweets(&svc), 0);
}

#[test]
fn test_retry_budget_caps_failures() {
    // Given: every entry fails to promote
    let svc = setup(&[1, 2, 3, 4, 5, 6, 7, 8], &[]);
    for post in 1..=8 {
        svc.fail_retweet(post);
    }
    let options = RotationOptions {
        max_consecutive_failures: 3,
        ..RotationOptions::default()
    };

    let outcome = rotate(&svc, MAIN, BACKUP, options).unwrap();

    assert_eq!(outcome.status, RotationStatus::RetryBudgetExhausted);
    assert_eq!(outcome.retries(), 3);
    assert_eq!(svc.entries(MAIN), posts(&[4, 5, 6, 7, 8]));
    assert_eq!(svc.entries(BACKUP), posts(&[1, 2, 3]));
}

#[test]
fn test_unpromotable_source_and_backup_terminate() {
    // Given: source and backup both hold only unpromotable entries
    let svc = setup(&[1], &[2, 3]);
    for post in 1..=3 {
        svc.fail_retweet(post);
    }

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    // Then: the refill ran once and the rotation ended without promoting
    assert!(outcome.refill.is_some());
    assert!(outcome.promoted().is_none());
    assert_eq!(count_retweets(&svc), 3);
    assert_eq!(
        svc.count_calls(|c| {
            matches!(c, RemoteCall::AddEntry { collection, .. } if *collection == MAIN)
        }),
        2
    );
}

#[test]
fn test_failed_relocation_is_reported() {
    let svc = setup(&[11, 12], &[]);
    svc.reject_add(11);

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    assert_eq!(outcome.promoted(), Some(PostId(11)));
    assert_eq!(outcome.relocation_failures.len(), 1);
    assert_eq!(outcome.relocation_failures[0].stage, RelocationStage::Add);
}

#[test]
fn test_source_read_failure_is_an_error() {
    let svc = setup(&[11, 12, 13], &[]);
    svc.fail_pages_after(MAIN, 1);

    let err = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap_err();

    assert_eq!(err.code(), "ERR_TRANSPORT");
    assert_eq!(count_retweets(&svc), 0);
}

#[test]
fn test_rotate_logs_boundaries() {
    let capture = init_test_capture();
    let svc = setup(&[901, 902], &[]);

    rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    capture.assert_event_exists("rotate", "start");
    capture.assert_event_exists("rotate", "end");
    assert!(capture
        .events_for_post(PostId(901))
        .iter()
        .any(|e| e.field("message") == Some("Retweeted")));
}

#[test]
fn test_refused_and_transport_skips_are_told_apart() {
    let capture = init_test_capture();
    let svc = setup(&[931, 932, 933], &[]);
    svc.fail_retweet(931);
    svc.fail_retweet_with(
        932,
        RotatorError::Transport {
            message: "connection reset".to_string(),
        },
    );

    let outcome = rotate(&svc, MAIN, BACKUP, RotationOptions::default()).unwrap();

    assert_eq!(outcome.promoted(), Some(PostId(933)));
    assert_eq!(outcome.skipped.len(), 2);
    assert!(outcome.skipped[0].refused);
    assert!(!outcome.skipped[1].refused);
    assert_eq!(outcome.skipped[1].error.code(), "ERR_TRANSPORT");

    let refused = capture.events_for_post(PostId(931));
    assert!(refused.iter().any(|e| e.level == Level::WARN
        && e.field("refused") == Some("true")
        && e.field("message") == Some("Post refused promotion, trying next entry")));

    let in_transit = capture.events_for_post(PostId(932));
    assert!(in_transit.iter().any(|e| e.level == Level::ERROR
        && e.field("refused") == Some("false")
        && e.field("message") == Some("Promotion failed in transit, trying next entry")));
}
