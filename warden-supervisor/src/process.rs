//! The supervised OS process.
//!
//! [`Launcher`] and [`ProcessHandle`] are the seams the supervisor drives;
//! [`ChildLauncher`] / [`ChildProcess`] implement them over
//! `tokio::process`. Signals are only ever addressed to the tracked child.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use warden_core::LaunchCommand;

use crate::error::ProcessError;

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    StillRunning,
}

/// A single live (or recently exited) child process.
#[async_trait]
pub trait ProcessHandle: Send {
    /// OS process id, captured at launch.
    fn id(&self) -> Option<u32>;

    /// Write `text` plus a newline to the process's stdin and flush.
    async fn write_line(&mut self, text: &str) -> Result<(), ProcessError>;

    /// Best-effort graceful termination signal. Never blocks; failures are logged.
    fn terminate(&mut self);

    /// Forced termination. Succeeds if the process has already exited.
    async fn kill(&mut self) -> Result<(), ProcessError>;

    /// Wait up to `timeout` for the process to exit.
    async fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome, ProcessError>;

    /// Non-blocking exit check.
    fn try_status(&mut self) -> Result<Option<ExitStatus>, ProcessError>;
}

/// Spawns server processes.
pub trait Launcher: Send + Sync {
    fn launch(
        &self,
        command: &LaunchCommand,
        working_dir: &Path,
    ) -> std::io::Result<Box<dyn ProcessHandle>>;
}

// ---------------------------------------------------------------------------
// tokio::process implementation
// ---------------------------------------------------------------------------

/// Launches the server with stdin piped and stdout/stderr inherited.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildLauncher;

impl Launcher for ChildLauncher {
    fn launch(
        &self,
        command: &LaunchCommand,
        working_dir: &Path,
    ) -> std::io::Result<Box<dyn ProcessHandle>> {
        let mut cmd = Command::new(command.program());
        cmd.args(command.args())
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        // Own process group: a terminal ctrl-c reaches only the supervisor,
        // which then runs the stop protocol.
        #[cfg(unix)]
        cmd.process_group(0);
        let child = cmd.spawn()?;
        Ok(Box::new(ChildProcess::new(child)))
    }
}

pub struct ChildProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    pid: Option<u32>,
}

impl ChildProcess {
    pub fn new(mut child: Child) -> Self {
        let stdin = child.stdin.take();
        let pid = child.id();
        Self { child, stdin, pid }
    }
}

#[async_trait]
impl ProcessHandle for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    async fn write_line(&mut self, text: &str) -> Result<(), ProcessError> {
        let stdin = self.stdin.as_mut().ok_or(ProcessError::StreamClosed)?;
        let line = format!("{text}\n");
        let result = match stdin.write_all(line.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                self.stdin = None;
                Err(ProcessError::StreamClosed)
            }
            Err(err) => Err(err.into()),
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        // `Child::id` is `None` once the child has been reaped, so a recycled
        // pid is never signalled.
        let Some(pid) = self.child.id() else {
            tracing::debug!(pid = ?self.pid, "process already reaped, skipping SIGTERM");
            return;
        };
        match i32::try_from(pid) {
            Ok(raw) => {
                if let Err(err) = signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
                    tracing::warn!(pid, error = %err, "failed to send SIGTERM");
                }
            }
            Err(_) => tracing::warn!(pid, "pid out of range, skipping SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {
        // No console-independent graceful signal here; `kill` follows.
        tracing::debug!(pid = ?self.pid, "graceful terminate unsupported on this platform");
    }

    async fn kill(&mut self) -> Result<(), ProcessError> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        if let Err(err) = self.child.start_kill() {
            // Exited between the check and the signal.
            if self.child.try_wait()?.is_none() {
                return Err(err.into());
            }
        }
        Ok(())
    }

    async fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome, ProcessError> {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(status) => Ok(WaitOutcome::Exited(status?)),
            Err(_) => Ok(WaitOutcome::StillRunning),
        }
    }

    fn try_status(&mut self) -> Result<Option<ExitStatus>, ProcessError> {
        Ok(self.child.try_wait()?)
    }
}
