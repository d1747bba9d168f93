use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rotator_engine::commands::rotate::{RotationOutcome, RotationStatus};
use rotator_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use std::error::Error;
use std::path::Path;

use super::runtime::{run_repeated, RepeatArgs, Runtime};
use crate::config::CollectionRef;

#[derive(Debug, Args)]
pub struct RotateArgs {
    /// Queue to promote from
    #[arg(long, default_value = "main")]
    pub source: CollectionRef,

    /// Queue that receives promoted and skipped heads
    #[arg(long, default_value = "backup")]
    pub backup: CollectionRef,

    /// Override `rotation.max_consecutive_failures`
    #[arg(long)]
    pub max_failures: Option<usize>,

    #[command(flatten)]
    pub repeat: RepeatArgs,
}

pub fn execute(args: RotateArgs, config_path: &Path) -> Result<(), Box<dyn Error>> {
    let runtime = Runtime::load(config_path)?;
    let source = runtime.collection(args.source)?;
    let backup = runtime.collection(args.backup)?;

    let mut options = runtime.config.rotation_options();
    if let Some(max) = args.max_failures {
        options.max_consecutive_failures = max;
    }

    let mut rng = StdRng::from_entropy();
    run_repeated("rotate", &args.repeat, |_| {
        let result = apply_engine_command(
            EngineCommand::Rotate {
                source,
                backup,
                options,
            },
            &runtime.client,
            &runtime.store,
            &mut rng,
        )?;
        match result {
            EngineCommandResult::Rotate(outcome) => report(&outcome),
            other => Err(format!("unexpected engine result: {:?}", other).into()),
        }
    })
}

fn report(outcome: &RotationOutcome) -> Result<(), Box<dyn Error>> {
    if let Some(refill) = &outcome.refill {
        println!(
            "Refilled {} entries from {}",
            refill.moved.len(),
            refill.source
        );
    }
    for skipped in &outcome.skipped {
        let reason = if skipped.refused { "refused" } else { "failed" };
        println!("  skipped {} ({}): {}", skipped.post_id, reason, skipped.error);
    }
    for failure in &outcome.relocation_failures {
        println!(
            "  could not move {} to backup: {}",
            failure.post_id, failure.error
        );
    }

    match outcome.status {
        RotationStatus::Promoted(post_id) => {
            println!(
                "Promoted {} after {} skipped entries",
                post_id,
                outcome.retries()
            );
            Ok(())
        }
        RotationStatus::NothingToPromote => {
            println!("Nothing to promote: source and backup are empty");
            Ok(())
        }
        RotationStatus::RetryBudgetExhausted => Err(format!(
            "gave up after {} entries could not be promoted",
            outcome.skipped.len()
        )
        .into()),
    }
}
