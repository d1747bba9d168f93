use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rotator_engine::commands::relocate::RelocationMode;
use rotator_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use std::error::Error;
use std::path::Path;

use super::runtime::Runtime;
use crate::config::CollectionRef;

#[derive(Debug, Args)]
pub struct RelocateArgs {
    /// Collection to take entries from
    pub from: CollectionRef,

    /// Collection to add entries to
    pub to: CollectionRef,

    /// Keep the entries in the source collection
    #[arg(long)]
    pub copy: bool,
}

pub fn execute(args: RelocateArgs, config_path: &Path) -> Result<(), Box<dyn Error>> {
    let runtime = Runtime::load(config_path)?;
    let source = runtime.collection(args.from)?;
    let destination = runtime.collection(args.to)?;
    let mode = if args.copy {
        RelocationMode::Copy
    } else {
        RelocationMode::Move
    };

    let result = apply_engine_command(
        EngineCommand::Relocate {
            source,
            destination,
            mode,
            page_size: runtime.config.rotation.page_size,
        },
        &runtime.client,
        &runtime.store,
        &mut StdRng::from_entropy(),
    )?;
    let report = match result {
        EngineCommandResult::Relocate(report) => report,
        other => return Err(format!("unexpected engine result: {:?}", other).into()),
    };

    let verb = match report.mode {
        RelocationMode::Move => "Moved",
        RelocationMode::Copy => "Copied",
    };
    println!(
        "{} {} entries from {} to {}",
        verb,
        report.moved.len(),
        report.source,
        report.destination
    );
    for failure in &report.failed {
        println!(
            "  failed {} ({:?}): {}",
            failure.post_id, failure.stage, failure.error
        );
    }

    if !report.is_complete() {
        return Err(format!("{} entries were not relocated", report.failed.len()).into());
    }
    Ok(())
}
