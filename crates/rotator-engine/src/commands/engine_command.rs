//! Engine-level commands.
//!
//! Every entry point (CLI, tests) goes through `apply_engine_command`.

#![allow(clippy::result_large_err)]

use rand::RngCore;
use rotator_core::core_types::RequestId;
use rotator_core::{CollectionId, CollectionService};
use rotator_store::errors::Result;
use rotator_store::ArchiveStore;
use std::path::PathBuf;

use crate::commands::archive::{archive_collection, ArchiveMode, ArchiveReport};
use crate::commands::relocate::{relocate_all, RelocationMode, RelocationReport};
use crate::commands::rotate::{rotate, RotationOptions, RotationOutcome};
use crate::commands::shuffle::{shuffle, ShuffleOptions, ShuffleOutcome};

#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Promote the head of `source`, moving it to `backup`.
    Rotate {
        source: CollectionId,
        backup: CollectionId,
        options: RotationOptions,
    },
    /// Move the head of `collection` to a random later position.
    Shuffle {
        collection: CollectionId,
        options: ShuffleOptions,
    },
    /// Move or copy every entry of `source` to `destination`.
    Relocate {
        source: CollectionId,
        destination: CollectionId,
        mode: RelocationMode,
        page_size: usize,
    },
    /// Write the collection's post records to its archive file.
    /// `path = None` uses the store's default path.
    Archive {
        collection: CollectionId,
        path: Option<PathBuf>,
        mode: ArchiveMode,
        page_size: usize,
    },
}

#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Rotate(RotationOutcome),
    Shuffle(ShuffleOutcome),
    Relocate(RelocationReport),
    Archive(ArchiveReport),
}

/// Apply an engine command against a collection service.
///
/// Each invocation gets a fresh `RequestId`: it tags the log span of the
/// command and is attached to the returned error.
pub fn apply_engine_command(
    cmd: EngineCommand,
    service: &dyn CollectionService,
    archive: &ArchiveStore,
    rng: &mut dyn RngCore,
) -> Result<EngineCommandResult> {
    let request_id = RequestId::new();
    let span = tracing::info_span!("engine_command", request_id = %request_id);
    let _entered = span.enter();

    dispatch(cmd, service, archive, rng).map_err(|e| e.with_request_id(request_id))
}

fn dispatch(
    cmd: EngineCommand,
    service: &dyn CollectionService,
    archive: &ArchiveStore,
    rng: &mut dyn RngCore,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::Rotate {
            source,
            backup,
            options,
        } => rotate(service, source, backup, options).map(EngineCommandResult::Rotate),
        EngineCommand::Shuffle {
            collection,
            options,
        } => shuffle(service, collection, options, rng).map(EngineCommandResult::Shuffle),
        EngineCommand::Relocate {
            source,
            destination,
            mode,
            page_size,
        } => relocate_all(service, source, destination, mode, page_size)
            .map(EngineCommandResult::Relocate),
        EngineCommand::Archive {
            collection,
            path,
            mode,
            page_size,
        } => archive_collection(service, archive, collection, path.as_deref(), mode, page_size)
            .map(EngineCommandResult::Archive),
    }
}
