//! Bounded execution of external commands.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::SyncError;

/// Captured result of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program args…` to completion, failing with [`SyncError::Timeout`] if
/// it takes longer than `limit`.
///
/// Arguments are passed as OS strings, so non-UTF-8 paths reach the program
/// unchanged. `step` names the operation in errors and logs (e.g.
/// `"git pull"`). The child is killed if the timeout fires.
pub async fn run_bounded<S: AsRef<OsStr>>(
    step: &str,
    program: &Path,
    args: &[S],
    limit: Duration,
) -> Result<CommandOutput, SyncError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(
        step,
        program = %program.display(),
        args = ?args.iter().map(|a| a.as_ref()).collect::<Vec<&OsStr>>(),
        "running external command",
    );

    let child = cmd.spawn().map_err(|source| SyncError::Spawn {
        program: program.display().to_string(),
        source,
    })?;

    // Dropping the `wait_with_output` future on timeout drops the child,
    // which kills it.
    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| SyncError::Spawn {
            program: program.display().to_string(),
            source,
        })?,
        Err(_) => {
            tracing::warn!(step, timeout_secs = limit.as_secs(), "external command timed out");
            return Err(SyncError::Timeout {
                step: step.to_owned(),
                after: limit,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();

    if !output.status.success() {
        return Err(SyncError::CommandFailed {
            step: step.to_owned(),
            status: output.status.to_string(),
            stderr,
        });
    }
    Ok(CommandOutput { stdout, stderr })
}
