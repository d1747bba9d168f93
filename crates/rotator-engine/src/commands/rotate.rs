//! Queue rotation
//!
//! Promotes (retweets) the head of a source collection and moves it to a
//! backup collection. A head that cannot be promoted is moved to the backup
//! as well and the next head is tried, up to a per-invocation failure budget.
//!
//! ## Phases
//!
//! `Idle → Fetching → Selecting → Promoting → Relocating → Idle`. Nothing is
//! persisted between invocations; every call starts from `Idle`.
//!
//! The refill guard runs at most once per invocation, before the first fetch.

#![allow(clippy::result_large_err)]

use rotator_core::errors::ExError;
use rotator_core::{log_op_end, log_op_error, log_op_start};
use rotator_core::{CollectionId, CollectionService, PostId, RotatorError};
use rotator_store::errors::Result;

use crate::commands::fetch::{fetch_all, is_effectively_empty, DEFAULT_PAGE_SIZE};
use crate::commands::relocate::{
    relocate_all, relocate_entry, RelocationFailure, RelocationMode, RelocationReport,
};

/// Default number of unpromotable heads tolerated per invocation
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationOptions {
    pub page_size: usize,
    /// Failed heads after which the invocation gives up; `0` behaves as `1`
    pub max_consecutive_failures: usize,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    Idle,
    Fetching,
    Selecting,
    Promoting,
    Relocating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    /// The post was retweeted and handed to the backup collection
    Promoted(PostId),
    /// The source was empty even after the refill guard
    NothingToPromote,
    /// Too many heads in a row could not be promoted
    RetryBudgetExhausted,
}

/// A head that could not be promoted
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub post_id: PostId,
    /// The service answered and refused this post. `false` means the
    /// attempt failed in transit and the post may be fine.
    pub refused: bool,
    pub error: ExError,
}

#[derive(Debug, Clone)]
pub struct RotationOutcome {
    pub status: RotationStatus,
    /// Unpromotable heads, in the order they were tried
    pub skipped: Vec<SkippedEntry>,
    /// Report of the refill from the backup, if the guard fired
    pub refill: Option<RelocationReport>,
    /// Entries that could not be moved to the backup after being tried
    pub relocation_failures: Vec<RelocationFailure>,
}

impl RotationOutcome {
    pub fn promoted(&self) -> Option<PostId> {
        match self.status {
            RotationStatus::Promoted(post) => Some(post),
            _ => None,
        }
    }

    /// How many times the rotation moved on to the next head
    pub fn retries(&self) -> usize {
        self.skipped.len()
    }
}

/// Rotate the head of `source` into `backup`.
///
/// ## Errors
///
/// Only reads of a whole collection abort the rotation. Failures tied to a
/// single post are reported in the outcome.
pub fn rotate(
    service: &dyn CollectionService,
    source: CollectionId,
    backup: CollectionId,
    options: RotationOptions,
) -> Result<RotationOutcome> {
    log_op_start!(
        "rotate",
        collection_id = source.get(),
        backup_id = backup.get()
    );
    let start = std::time::Instant::now();

    let outcome = rotate_impl(service, source, backup, options).map_err(|e| {
        log_op_error!(
            "rotate",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "rotate",
        duration_ms = start.elapsed().as_millis() as u64,
        status = ?outcome.status,
        retries = outcome.retries()
    );
    Ok(outcome)
}

fn rotate_impl(
    service: &dyn CollectionService,
    source: CollectionId,
    backup: CollectionId,
    options: RotationOptions,
) -> Result<RotationOutcome> {
    let mut outcome = RotationOutcome {
        status: RotationStatus::NothingToPromote,
        skipped: Vec::new(),
        refill: None,
        relocation_failures: Vec::new(),
    };

    if is_effectively_empty(service, source, options.page_size)? {
        tracing::info!(
            collection_id = source.get(),
            backup_id = backup.get(),
            "Source effectively empty, refilling from backup"
        );
        outcome.refill = Some(relocate_all(
            service,
            backup,
            source,
            RelocationMode::Move,
            options.page_size,
        )?);
    }

    loop {
        enter(RotationPhase::Fetching, source);
        let entries = fetch_all(service, source, options.page_size)?;

        enter(RotationPhase::Selecting, source);
        let Some(head) = entries.first().map(|e| e.post_id) else {
            outcome.status = RotationStatus::NothingToPromote;
            break;
        };

        enter(RotationPhase::Promoting, source);
        let promoted = try_promote(service, head);

        enter(RotationPhase::Relocating, source);
        if let Err(failure) =
            relocate_entry(service, source, backup, head, RelocationMode::Move)
        {
            tracing::warn!(
                collection_id = source.get(),
                post_id = head.get(),
                error = %failure.error,
                "Could not move entry to backup"
            );
            outcome.relocation_failures.push(failure);
        }

        match promoted {
            Ok(()) => {
                tracing::info!(post_id = head.get(), "Retweeted");
                outcome.status = RotationStatus::Promoted(head);
                break;
            }
            Err(err) => {
                let refused = err.is_semantic();
                if refused {
                    tracing::warn!(
                        post_id = head.get(),
                        refused,
                        error = %err,
                        "Post refused promotion, trying next entry"
                    );
                } else {
                    tracing::error!(
                        post_id = head.get(),
                        refused,
                        error = %err,
                        "Promotion failed in transit, trying next entry"
                    );
                }
                outcome.skipped.push(SkippedEntry {
                    post_id: head,
                    refused,
                    error: ExError::from(err).with_op("promote"),
                });
                if outcome.skipped.len() >= options.max_consecutive_failures.max(1) {
                    outcome.status = RotationStatus::RetryBudgetExhausted;
                    break;
                }
            }
        }
    }

    enter(RotationPhase::Idle, source);
    Ok(outcome)
}

/// Retweet `post`, undoing an existing retweet first.
fn try_promote(
    service: &dyn CollectionService,
    post: PostId,
) -> std::result::Result<(), RotatorError> {
    let record = service.fetch_post(post)?;
    if record.retweeted {
        service.unretweet(post)?;
        tracing::debug!(post_id = post.get(), "Unretweeted before retweeting again");
    }
    service.retweet(post)
}

fn enter(phase: RotationPhase, source: CollectionId) {
    tracing::debug!(collection_id = source.get(), phase = ?phase, "Rotation phase");
}
