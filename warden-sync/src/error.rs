//! Error types for warden-sync.

use std::time::Duration;

use thiserror::Error;

/// All errors that can arise from sync operations.
///
/// A nonzero exit of the external tool is the only failure signal the tool
/// itself gives; the other variants cover the runner around it.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The external program could not be started (missing binary, permissions).
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran and exited unsuccessfully.
    #[error("{step} failed ({status}): {stderr}")]
    CommandFailed {
        step: String,
        status: String,
        stderr: String,
    },

    /// The external program did not finish within the allowed time and was killed.
    #[error("{step} timed out after {}s", after.as_secs_f64())]
    Timeout { step: String, after: Duration },
}
