use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rotator_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use std::error::Error;
use std::path::Path;

use super::runtime::{run_repeated, RepeatArgs, Runtime};
use crate::config::CollectionRef;

#[derive(Debug, Args)]
pub struct ShuffleArgs {
    /// Collection whose head is moved
    #[arg(default_value = "main")]
    pub collection: CollectionRef,

    /// Seed for the position choice, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub repeat: RepeatArgs,
}

pub fn execute(args: ShuffleArgs, config_path: &Path) -> Result<(), Box<dyn Error>> {
    let runtime = Runtime::load(config_path)?;
    let collection = runtime.collection(args.collection)?;
    let options = runtime.config.shuffle_options();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    run_repeated("shuffle", &args.repeat, |_| {
        let result = apply_engine_command(
            EngineCommand::Shuffle {
                collection,
                options,
            },
            &runtime.client,
            &runtime.store,
            &mut rng,
        )?;
        match result {
            EngineCommandResult::Shuffle(outcome) => {
                println!(
                    "Moved {} after {} (position {} of {})",
                    outcome.post_id,
                    outcome.relative_to,
                    outcome.target_index,
                    outcome.sample_len
                );
                Ok(())
            }
            other => Err(format!("unexpected engine result: {:?}", other).into()),
        }
    })
}
