use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rotator_engine::commands::archive::ArchiveMode;
use rotator_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use std::error::Error;
use std::path::{Path, PathBuf};

use super::runtime::Runtime;
use crate::config::CollectionRef;

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    /// Collection to archive
    #[arg(default_value = "main")]
    pub collection: CollectionRef,

    /// Archive file (default: Collection-<id>.json in `archive.directory`)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Overwrite the file instead of merging into it
    #[arg(long)]
    pub replace: bool,
}

pub fn execute(args: ArchiveArgs, config_path: &Path) -> Result<(), Box<dyn Error>> {
    let runtime = Runtime::load(config_path)?;
    let collection = runtime.collection(args.collection)?;
    let mode = if args.replace {
        ArchiveMode::Replace
    } else {
        ArchiveMode::Merge
    };

    let result = apply_engine_command(
        EngineCommand::Archive {
            collection,
            path: args.output,
            mode,
            page_size: runtime.config.rotation.page_size,
        },
        &runtime.client,
        &runtime.store,
        &mut StdRng::from_entropy(),
    )?;
    let report = match result {
        EngineCommandResult::Archive(report) => report,
        other => return Err(format!("unexpected engine result: {:?}", other).into()),
    };

    println!("Archive written: {}", report.path.display());
    println!("  fetched: {}", report.fetched);
    println!("  records: {}", report.written);
    if !report.skipped.is_empty() {
        println!("  skipped: {}", report.skipped.len());
        for skipped in &report.skipped {
            println!("    {}: {}", skipped.post_id, skipped.error);
        }
    }
    Ok(())
}
