//! Snapshot persistence
//!
//! Resolves every entry of a collection to its full post record and merges
//! the result into the collection's archive file. One `fetch_post` per entry.

#![allow(clippy::result_large_err)]

use rotator_core::errors::ExError;
use rotator_core::{log_op_end, log_op_error, log_op_start};
use rotator_core::{CollectionId, CollectionService, PostId};
use rotator_store::errors::Result;
use rotator_store::{dedup_records, merge_records, ArchiveStore};
use std::path::{Path, PathBuf};

use crate::commands::fetch::fetch_all;

/// What happens to records already in the archive file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveMode {
    /// Keep them, after the freshly fetched records
    #[default]
    Merge,
    /// Drop them; the file holds only the fresh fetch
    Replace,
}

#[derive(Debug, Clone)]
pub struct SkippedPost {
    pub post_id: PostId,
    pub error: ExError,
}

#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub path: PathBuf,
    /// Entries read from the collection
    pub fetched: usize,
    /// Entries whose record could not be fetched
    pub skipped: Vec<SkippedPost>,
    /// Records in the file after the write
    pub written: usize,
}

/// Archive `collection` to `path`, or to the store's default path for it.
///
/// ## Errors
///
/// Fails if the collection cannot be read, the existing archive cannot be
/// decoded, or the write fails. The previous file is intact in every case.
pub fn archive_collection(
    service: &dyn CollectionService,
    store: &ArchiveStore,
    collection: CollectionId,
    path: Option<&Path>,
    mode: ArchiveMode,
    page_size: usize,
) -> Result<ArchiveReport> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| store.default_path(collection));

    log_op_start!(
        "archive_collection",
        collection_id = collection.get(),
        path = %path.display()
    );
    let start = std::time::Instant::now();

    let report = archive_impl(service, store, collection, path, mode, page_size).map_err(|e| {
        log_op_error!(
            "archive_collection",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "archive_collection",
        duration_ms = start.elapsed().as_millis() as u64,
        entry_count = report.written,
        skipped_count = report.skipped.len()
    );
    Ok(report)
}

fn archive_impl(
    service: &dyn CollectionService,
    store: &ArchiveStore,
    collection: CollectionId,
    path: PathBuf,
    mode: ArchiveMode,
    page_size: usize,
) -> Result<ArchiveReport> {
    let entries = fetch_all(service, collection, page_size)?;

    let mut fresh = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for entry in &entries {
        match service.fetch_post(entry.post_id) {
            Ok(record) => fresh.push(record),
            Err(err) => {
                tracing::warn!(
                    collection_id = collection.get(),
                    post_id = entry.post_id.get(),
                    error = %err,
                    "Could not fetch post, leaving it out of the archive"
                );
                skipped.push(SkippedPost {
                    post_id: entry.post_id,
                    error: ExError::from(err).with_op("archive_fetch_post"),
                });
            }
        }
    }

    let records = match mode {
        ArchiveMode::Merge => merge_records(fresh, store.load(&path)?),
        ArchiveMode::Replace => dedup_records(fresh),
    };
    store.save(&path, &records)?;

    Ok(ArchiveReport {
        path,
        fetched: entries.len(),
        skipped,
        written: records.len(),
    })
}
