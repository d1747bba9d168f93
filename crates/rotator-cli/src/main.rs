//! Rotator CLI
//!
//! Command-line interface for collection queue rotation

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "rotator")]
#[command(about = "Rotator - Collection queue rotation and archiving", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Retweet the head of a queue and move it to the backup queue
    Rotate(commands::rotate::RotateArgs),
    /// Move the head of a queue to a random later position
    Shuffle(commands::shuffle::ShuffleArgs),
    /// Move or copy every entry of one collection to another
    Relocate(commands::relocate::RelocateArgs),
    /// Write a collection's posts to its archive file
    Archive(commands::archive::ArchiveArgs),
}

fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let result = match cli.command {
        Commands::Rotate(args) => commands::rotate::execute(args, &cli.config),
        Commands::Shuffle(args) => commands::shuffle::execute(args, &cli.config),
        Commands::Relocate(args) => commands::relocate::execute(args, &cli.config),
        Commands::Archive(args) => commands::archive::execute(args, &cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
