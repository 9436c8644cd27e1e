//! `warden run`: supervise the server in the foreground.
//!
//! Settings are loaded (prompting for the data folder on first run), the world
//! is pulled, and the server is started. Typing `stop` or pressing ctrl-c
//! shuts it down and pushes the world.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use warden_core::{ConfigError, MemoryMb, DEFAULT_JAVA_RUNTIME};
use warden_supervisor::{
    init_tracing, ChildLauncher, GraceWait, LogFormat, StopPolicy, Supervisor, SupervisorConfig,
    DEFAULT_GRACE_WINDOW,
};
use warden_sync::{GitSync, NoopSync, SyncHook, DEFAULT_BRANCH, DEFAULT_REMOTE};

use super::config_store;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Memory allocation in MB for this and later runs.
    #[arg(long)]
    pub ram: Option<String>,

    /// Skip the git pull before start and the push after stop.
    #[arg(long)]
    pub no_sync: bool,

    /// Seconds the server gets to exit after `stop` before it is signalled.
    #[arg(long, value_name = "SECS")]
    pub grace_secs: Option<u64>,

    /// End the grace window as soon as the server has exited.
    #[arg(long)]
    pub early_exit: bool,

    /// Java runtime used when no custom launch command is configured.
    #[arg(long, default_value = DEFAULT_JAVA_RUNTIME)]
    pub java: String,

    #[arg(long, default_value = DEFAULT_REMOTE)]
    pub remote: String,

    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        init_tracing(if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        });

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;
        let result = runtime.block_on(self.supervise());
        // A pending console read would otherwise hold the runtime open.
        runtime.shutdown_timeout(Duration::from_millis(100));
        result
    }

    async fn supervise(self) -> Result<()> {
        let store = config_store()?;
        let mut prompt = prompt_for_data_path;
        let mut settings = store
            .load(&mut prompt)
            .with_context(|| format!("failed to load {}", store.path().display()))?;

        if let Some(ram) = &self.ram {
            let memory = MemoryMb::parse(ram).context("invalid --ram")?;
            settings.set_memory(memory);
        }

        let sync: Arc<dyn SyncHook> = if self.no_sync {
            Arc::new(NoopSync)
        } else {
            Arc::new(GitSync::new().with_remote(self.remote.as_str(), self.branch.as_str()))
        };
        let config = SupervisorConfig {
            java_runtime: self.java.clone(),
            stop_policy: StopPolicy {
                grace: self
                    .grace_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_GRACE_WINDOW),
                wait: if self.early_exit {
                    GraceWait::UntilExit
                } else {
                    GraceWait::Full
                },
                ..StopPolicy::default()
            },
            ..SupervisorConfig::default()
        };
        let supervisor = Supervisor::builder(config, Arc::new(ChildLauncher), sync)
            .settings_store(Arc::new(store))
            .build();

        let started = supervisor
            .start(&settings)
            .await
            .context("server did not start")?;
        if started.pull.is_failed() {
            warn!("world pull failed; running with the local copy");
        }
        print_report(&started)?;
        info!("type `stop` or press ctrl-c to shut the server down");

        wait_for_stop_request().await?;

        let stopped = supervisor.stop().await.context("server did not stop cleanly")?;
        if stopped.push.is_failed() {
            warn!("world push failed; local changes are not on the remote");
        }
        print_report(&stopped)?;
        Ok(())
    }
}

fn print_report<T: serde::Serialize>(report: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("failed to render report")?
    );
    Ok(())
}

/// First-run prompt for the server data folder. EOF aborts the load.
fn prompt_for_data_path() -> Result<Option<PathBuf>, ConfigError> {
    print!("Server data folder: ");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(ConfigError::PathResolution(
            "no server data folder given".to_owned(),
        ));
    }
    let trimmed = line.trim();
    Ok((!trimmed.is_empty()).then(|| PathBuf::from(trimmed)))
}

/// Resolves on ctrl-c or a `stop` line on the console. After console EOF only
/// ctrl-c is watched.
async fn wait_for_stop_request() -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                info!("interrupt received");
                return Ok(());
            }
            line = lines.next_line(), if console_open => match line {
                Ok(Some(line)) if line.trim().eq_ignore_ascii_case("stop") => {
                    info!("stop requested from console");
                    return Ok(());
                }
                Ok(Some(line)) => warn!(input = %line.trim(), "unknown command; type `stop`"),
                Ok(None) => console_open = false,
                Err(err) => {
                    warn!(error = %err, "console read failed");
                    console_open = false;
                }
            },
        }
    }
}
