//! Bulk relocation between collections
//!
//! Not transactional. A failure on one entry is recorded in the report and
//! the remaining entries are still processed.

#![allow(clippy::result_large_err)]

use rotator_core::errors::ExError;
use rotator_core::{log_op_end, log_op_error, log_op_start};
use rotator_core::{AckOutcome, CollectionId, CollectionService, PostId};
use rotator_store::errors::Result;

use crate::commands::fetch::fetch_all;

/// Whether the source keeps its copy of a relocated entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelocationMode {
    /// Remove from the source, then add to the destination
    #[default]
    Move,
    /// Add to the destination only
    Copy,
}

/// Which half of a relocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationStage {
    Remove,
    Add,
}

#[derive(Debug, Clone)]
pub struct RelocationFailure {
    pub post_id: PostId,
    pub stage: RelocationStage,
    pub error: ExError,
}

/// Result of `relocate_all`
#[derive(Debug, Clone)]
pub struct RelocationReport {
    pub source: CollectionId,
    pub destination: CollectionId,
    pub mode: RelocationMode,
    /// Entries relocated, in source order
    pub moved: Vec<PostId>,
    pub failed: Vec<RelocationFailure>,
}

impl RelocationReport {
    fn new(source: CollectionId, destination: CollectionId, mode: RelocationMode) -> Self {
        Self {
            source,
            destination,
            mode,
            moved: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_post_ids(&self) -> Vec<PostId> {
        self.failed.iter().map(|f| f.post_id).collect()
    }
}

/// Relocate a single entry.
///
/// In `Move` mode a rejected or failed remove stops before the add, so the
/// entry is never left in both collections.
pub fn relocate_entry(
    service: &dyn CollectionService,
    source: CollectionId,
    destination: CollectionId,
    post: PostId,
    mode: RelocationMode,
) -> std::result::Result<(), RelocationFailure> {
    if mode == RelocationMode::Move {
        service
            .remove_entry(source, post)
            .and_then(|ack| ack.into_result("remove", source, post))
            .map_err(|e| RelocationFailure {
                post_id: post,
                stage: RelocationStage::Remove,
                error: ExError::from(e).with_op("relocate_remove"),
            })?;
    }

    let ack = service
        .add_entry(destination, post)
        .and_then(|ack| ack.into_result("add", destination, post))
        .map_err(|e| RelocationFailure {
            post_id: post,
            stage: RelocationStage::Add,
            error: ExError::from(e).with_op("relocate_add"),
        })?;

    if let AckOutcome::AlreadyApplied { reason } = &ack.outcome {
        tracing::debug!(
            collection_id = destination.get(),
            post_id = post.get(),
            reason = reason.as_str(),
            "Entry already present in destination"
        );
    }

    Ok(())
}

/// Relocate every entry of `source` to `destination`, in source order.
///
/// Fails only if `source` cannot be read; per-entry failures are reported.
pub fn relocate_all(
    service: &dyn CollectionService,
    source: CollectionId,
    destination: CollectionId,
    mode: RelocationMode,
    page_size: usize,
) -> Result<RelocationReport> {
    log_op_start!(
        "relocate_all",
        collection_id = source.get(),
        destination_id = destination.get()
    );
    let start = std::time::Instant::now();

    let entries = fetch_all(service, source, page_size).map_err(|e| {
        log_op_error!(
            "relocate_all",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    let mut report = RelocationReport::new(source, destination, mode);
    for entry in entries {
        match relocate_entry(service, source, destination, entry.post_id, mode) {
            Ok(()) => report.moved.push(entry.post_id),
            Err(failure) => {
                tracing::warn!(
                    collection_id = source.get(),
                    post_id = entry.post_id.get(),
                    stage = ?failure.stage,
                    error = %failure.error,
                    "Relocation failed, continuing"
                );
                report.failed.push(failure);
            }
        }
    }

    log_op_end!(
        "relocate_all",
        duration_ms = start.elapsed().as_millis() as u64,
        entry_count = report.moved.len(),
        failed_count = report.failed.len()
    );
    Ok(report)
}
