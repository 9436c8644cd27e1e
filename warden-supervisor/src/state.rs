use std::fmt;

use serde::Serialize;

use warden_core::LaunchCommand;
use warden_sync::SyncError;

/// Lifecycle state of the supervised server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Starting => write!(f, "starting"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Outcome of a sync hook call. Failures are reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Failed(String),
}

impl SyncStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed(_))
    }
}

impl From<Result<(), SyncError>> for SyncStatus {
    fn from(result: Result<(), SyncError>) -> Self {
        match result {
            Ok(()) => SyncStatus::Synced,
            Err(err) => SyncStatus::Failed(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartReport {
    pub pid: Option<u32>,
    pub command: LaunchCommand,
    pub pull: SyncStatus,
    pub settings_saved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopReport {
    /// The stop token reached the server's stdin.
    pub stop_command_delivered: bool,
    /// The process had exited by the end of the grace wait.
    pub exited_during_grace: bool,
    pub exit_status: Option<String>,
    pub push: SyncStatus,
    pub duration_ms: u128,
}
