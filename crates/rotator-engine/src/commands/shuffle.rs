//! Shuffle: move the head of a collection to a random later position
//!
//! Best effort, one reposition per call, no retry.

#![allow(clippy::result_large_err)]

use rand::Rng;
use rotator_core::errors::ExError;
use rotator_core::{log_op_end, log_op_error, log_op_start};
use rotator_core::{CollectionId, CollectionService, PostId, RemoteAck, RotatorError};
use rotator_store::errors::Result;

use crate::commands::fetch::{fetch_sample, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleOptions {
    /// How many entries from the head are considered
    pub sample_size: usize,
    /// Lowest index the head may be placed after
    pub min_offset: usize,
    pub page_size: usize,
}

impl Default for ShuffleOptions {
    fn default() -> Self {
        Self {
            sample_size: 600,
            min_offset: 200,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShuffleOutcome {
    pub post_id: PostId,
    pub relative_to: PostId,
    /// Index of `relative_to` within the sample
    pub target_index: usize,
    pub sample_len: usize,
    pub ack: RemoteAck,
}

/// Move the head of `collection` next to an entry drawn uniformly from
/// sample indices `[min_offset, sample_len)`.
///
/// ## Errors
///
/// - `CollectionTooSmall` if the sample has no index at or past `min_offset`
/// - `AckRejected` if the service refuses the reposition
pub fn shuffle<R: Rng + ?Sized>(
    service: &dyn CollectionService,
    collection: CollectionId,
    options: ShuffleOptions,
    rng: &mut R,
) -> Result<ShuffleOutcome> {
    log_op_start!("shuffle", collection_id = collection.get());
    let start = std::time::Instant::now();

    let outcome = shuffle_impl(service, collection, options, rng).map_err(|e| {
        log_op_error!(
            "shuffle",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "shuffle",
        duration_ms = start.elapsed().as_millis() as u64,
        post_id = outcome.post_id.get(),
        relative_to = outcome.relative_to.get()
    );
    Ok(outcome)
}

fn shuffle_impl<R: Rng + ?Sized>(
    service: &dyn CollectionService,
    collection: CollectionId,
    options: ShuffleOptions,
    rng: &mut R,
) -> Result<ShuffleOutcome> {
    let sample = fetch_sample(service, collection, options.page_size, options.sample_size)?;

    // Index 0 is the head itself
    let lower = options.min_offset.max(1);
    if sample.len() <= lower {
        return Err(ExError::from(RotatorError::CollectionTooSmall {
            collection_id: collection,
            len: sample.len(),
            required: lower,
        })
        .with_op("shuffle"));
    }

    let post_id = sample[0].post_id;
    let target_index = rng.gen_range(lower..sample.len());
    let relative_to = sample[target_index].post_id;

    tracing::debug!(
        collection_id = collection.get(),
        post_id = post_id.get(),
        relative_to = relative_to.get(),
        target_index = target_index,
        "Repositioning head"
    );

    let ack = service
        .reposition(collection, post_id, relative_to)
        .and_then(|ack| ack.into_result("move", collection, post_id))
        .map_err(|e| ExError::from(e).with_op("shuffle"))?;

    Ok(ShuffleOutcome {
        post_id,
        relative_to,
        target_index,
        sample_len: sample.len(),
        ack,
    })
}
