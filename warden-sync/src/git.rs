//! `git`-backed [`SyncHook`].
//!
//! ```text
//! pull:      git -C <world> pull <remote> <branch>
//! push_all:  git -C <world> add .
//!            git -C <world> status --porcelain     (commit only if non-empty)
//!            git -C <world> commit -m <message>
//!            git -C <world> push <remote> <branch>
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::hook::SyncHook;
use crate::runner::{run_bounded, CommandOutput};

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct GitSync {
    program: PathBuf,
    remote: String,
    branch: String,
    timeout: Duration,
}

impl Default for GitSync {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
            remote: DEFAULT_REMOTE.to_owned(),
            branch: DEFAULT_BRANCH.to_owned(),
            timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

impl GitSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `git` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        self.remote = remote.into();
        self.branch = branch.into();
        self
    }

    /// Upper bound for each individual git invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    async fn git(&self, repo: &Path, step: &str, args: &[&str]) -> Result<CommandOutput, SyncError> {
        let mut full = vec![OsStr::new("-C"), repo.as_os_str()];
        full.extend(args.iter().map(OsStr::new));
        run_bounded(step, &self.program, full.as_slice(), self.timeout).await
    }
}

#[async_trait]
impl SyncHook for GitSync {
    async fn pull(&self, path: &Path) -> Result<(), SyncError> {
        self.git(path, "git pull", &["pull", self.remote.as_str(), self.branch.as_str()])
            .await?;
        tracing::info!(
            path = %path.display(),
            remote = %self.remote,
            branch = %self.branch,
            "world folder pulled",
        );
        Ok(())
    }

    async fn push_all(&self, path: &Path, message: &str) -> Result<(), SyncError> {
        self.git(path, "git add", &["add", "."]).await?;

        let status = self
            .git(path, "git status", &["status", "--porcelain"])
            .await?;
        if status.stdout.is_empty() {
            tracing::info!(path = %path.display(), "no world changes to commit");
        } else {
            self.git(path, "git commit", &["commit", "-m", message])
                .await?;
        }

        self.git(path, "git push", &["push", self.remote.as_str(), self.branch.as_str()])
            .await?;
        tracing::info!(
            path = %path.display(),
            remote = %self.remote,
            branch = %self.branch,
            "world folder pushed",
        );
        Ok(())
    }
}
