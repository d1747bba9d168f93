//! Archive files
//!
//! An archive is a JSON array of full post records for one collection,
//! deduplicated by post id. It only ever grows through `merge_records`.

pub mod atomic;
pub mod file_store;

pub use file_store::ArchiveStore;

use rotator_core::{PostId, PostRecord};
use std::collections::HashSet;

/// Merge freshly fetched records with an existing archive.
///
/// Fresh records come first, then existing ones; the first record seen for
/// each post id is kept and later copies are dropped.
pub fn merge_records(fresh: Vec<PostRecord>, existing: Vec<PostRecord>) -> Vec<PostRecord> {
    dedup_records(fresh.into_iter().chain(existing))
}

/// Drop every record whose post id was already seen, keeping order
pub fn dedup_records(records: impl IntoIterator<Item = PostRecord>) -> Vec<PostRecord> {
    let mut seen: HashSet<PostId> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .collect()
}
