use thiserror::Error;

use warden_core::{ConfigError, LaunchCommand};

use crate::state::SupervisorState;

/// Failures of a supervisor lifecycle operation.
///
/// Sync failures are not errors at this level; they are carried in the
/// start/stop reports because they never block a transition.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("failed to launch `{command}`: {source}")]
    LaunchFailed {
        command: LaunchCommand,
        #[source]
        source: std::io::Error,
    },

    #[error("server is not running")]
    NotRunning,

    #[error("server is already {state}")]
    AlreadyRunning { state: SupervisorState },

    #[error("lifecycle task failed: {0}")]
    TaskFailed(String),
}

/// Errors from a single process handle operation.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process input stream is closed")]
    StreamClosed,

    #[error("process I/O error: {0}")]
    Io(#[from] std::io::Error),
}
