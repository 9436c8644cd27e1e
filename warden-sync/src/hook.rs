//! The synchronization seam used by the supervisor.

use std::path::Path;

use async_trait::async_trait;

use crate::error::SyncError;

/// Brackets the server lifecycle: `pull` before start, `push_all` after stop.
///
/// Both calls run to completion (or their own timeout) before returning.
#[async_trait]
pub trait SyncHook: Send + Sync {
    /// Bring `path` up to date with the remote.
    async fn pull(&self, path: &Path) -> Result<(), SyncError>;

    /// Stage everything under `path`, commit with `message`, and push.
    async fn push_all(&self, path: &Path, message: &str) -> Result<(), SyncError>;
}

/// A hook that never touches anything. Used when syncing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

#[async_trait]
impl SyncHook for NoopSync {
    async fn pull(&self, path: &Path) -> Result<(), SyncError> {
        tracing::debug!(path = %path.display(), "sync disabled, skipping pull");
        Ok(())
    }

    async fn push_all(&self, path: &Path, _message: &str) -> Result<(), SyncError> {
        tracing::debug!(path = %path.display(), "sync disabled, skipping push");
        Ok(())
    }
}
