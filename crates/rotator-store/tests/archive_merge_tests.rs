//! Archive merge properties
//!
//! Merging a fresh fetch into an archive never duplicates a post id, never
//! loses one, and is idempotent when repeated with the same input.

use proptest::prelude::*;
use rotator_core::{CollectionId, PostId, PostRecord};
use rotator_store::{merge_records, ArchiveStore};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn rec(id: u64) -> PostRecord {
    PostRecord::new(PostId(id)).with_field("text", serde_json::json!(format!("post {}", id)))
}

fn id_set(records: &[PostRecord]) -> BTreeSet<u64> {
    records.iter().map(|r| r.id.0).collect()
}

#[test]
fn test_merge_p1_p2_into_p2_p3() {
    // Given: an archive holding P2 and P3 on disk
    let temp_dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(temp_dir.path());
    let path = store.default_path(CollectionId(10));
    store.save(&path, &[rec(2), rec(3)]).unwrap();

    // When: a fresh fetch of P1 and P2 is merged and written back
    let existing = store.load(&path).unwrap();
    let merged = merge_records(vec![rec(1), rec(2)], existing);
    store.save(&path, &merged).unwrap();

    // Then: exactly P1, P2, P3 are persisted
    let persisted = store.load(&path).unwrap();
    assert_eq!(persisted.len(), 3);
    assert_eq!(id_set(&persisted), BTreeSet::from([1, 2, 3]));

    // And: a second identical run changes nothing
    let again = merge_records(vec![rec(1), rec(2)], store.load(&path).unwrap());
    store.save(&path, &again).unwrap();
    assert_eq!(store.load(&path).unwrap(), persisted);
}

proptest! {
    #[test]
    fn prop_merge_has_no_duplicates_and_loses_nothing(
        fresh in prop::collection::vec(0u64..50, 0..40),
        existing in prop::collection::vec(0u64..50, 0..40),
    ) {
        let fresh_records: Vec<PostRecord> = fresh.iter().copied().map(rec).collect();
        let existing_records: Vec<PostRecord> = existing.iter().copied().map(rec).collect();

        let merged = merge_records(fresh_records, existing_records);

        let expected: BTreeSet<u64> = fresh.iter().chain(existing.iter()).copied().collect();
        prop_assert_eq!(merged.len(), expected.len());
        prop_assert_eq!(id_set(&merged), expected);
    }

    #[test]
    fn prop_merge_is_idempotent(
        fresh in prop::collection::vec(0u64..50, 0..40),
        existing in prop::collection::vec(0u64..50, 0..40),
    ) {
        let fresh_records: Vec<PostRecord> = fresh.iter().copied().map(rec).collect();
        let existing_records: Vec<PostRecord> = existing.iter().copied().map(rec).collect();

        let once = merge_records(fresh_records.clone(), existing_records);
        let twice = merge_records(fresh_records, once.clone());

        prop_assert_eq!(twice, once);
    }
}
