//! Warden: game server supervisor with git-synced worlds.
//!
//! # Usage
//!
//! ```text
//! warden run [--ram <MB>] [--no-sync] [--grace-secs <N>] [--early-exit] [--java <PATH>]
//! warden config show
//! warden config set-ram <MB>
//! warden config set-path <PATH>
//! warden config set-command [TOKEN]...
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "warden",
    version,
    about = "Start, stop, and git-sync a game server",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pull the world, start the server, and stop it on `stop` or ctrl-c.
    Run(RunArgs),

    /// Inspect or change the persisted server settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}
