//! Error types for warden-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from settings validation and persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, disk full, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (write/save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on load; includes the settings file path.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.warden/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The memory allocation is not a positive integer number of megabytes.
    #[error("invalid memory allocation '{value}': expected a positive integer (MB)")]
    InvalidMemory { value: String },

    /// A custom launch command was configured but contains no tokens.
    #[error("launch command is empty")]
    EmptyLaunchCommand,

    /// No server data path has been configured yet.
    #[error("no server data path configured")]
    MissingDataPath,

    /// The path resolver gave up before supplying a data path.
    #[error("data path resolution aborted: {0}")]
    PathResolution(String),
}
