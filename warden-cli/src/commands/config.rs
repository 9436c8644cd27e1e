//! `warden config`: read and edit `~/.warden/server_config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::json;

use warden_core::{MemoryMb, DEFAULT_JAVA_RUNTIME};

use super::config_store;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the settings and the launch command they resolve to.
    Show,
    /// Set the memory allocation in megabytes.
    SetRam {
        /// Positive integer, e.g. 4096.
        ram: String,
    },
    /// Set the server data folder (the world is synced from `<PATH>/world`).
    SetPath { path: PathBuf },
    /// Set a custom launch command; with no tokens, revert to the default.
    SetCommand {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let store = config_store()?;

    match command {
        ConfigCommand::Show => {
            let settings = store
                .read()
                .with_context(|| format!("failed to read {}", store.path().display()))?;
            let launch = match settings.launch_command(DEFAULT_JAVA_RUNTIME) {
                Ok(command) => json!(command.tokens()),
                Err(err) => json!({ "error": err.to_string() }),
            };
            let payload = json!({
                "file": store.path().display().to_string(),
                "settings": settings,
                "launch_command": launch,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to render settings JSON")?
            );
        }
        ConfigCommand::SetRam { ram } => {
            let memory = MemoryMb::parse(&ram).context("ram not updated")?;
            let mut settings = store.read().context("failed to read settings")?;
            settings.set_memory(memory);
            store.save(&settings).context("failed to save settings")?;
            println!("ram set to {memory} MB");
        }
        ConfigCommand::SetPath { path } => {
            anyhow::ensure!(!path.as_os_str().is_empty(), "server path must not be empty");
            let mut settings = store.read().context("failed to read settings")?;
            settings.server_path = Some(path.clone());
            store.save(&settings).context("failed to save settings")?;
            println!("server path set to {}", path.display());
        }
        ConfigCommand::SetCommand { tokens } => {
            let mut settings = store.read().context("failed to read settings")?;
            if tokens.is_empty() {
                settings.start_command = None;
                println!("launch command reset to default");
            } else {
                println!("launch command set to: {}", tokens.join(" "));
                settings.start_command = Some(tokens);
            }
            store.save(&settings).context("failed to save settings")?;
        }
    }

    Ok(())
}
