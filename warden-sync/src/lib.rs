//! # warden-sync
//!
//! Version-control synchronization of the server's world folder.
//!
//! [`SyncHook`] is the seam the supervisor calls before start and after stop.
//! [`GitSync`] drives the `git` binary against the folder; every invocation is
//! bounded by a timeout (see [`runner`]). [`NoopSync`] disables syncing.

pub mod error;
pub mod git;
pub mod hook;
pub mod runner;

pub use error::SyncError;
pub use git::{GitSync, DEFAULT_BRANCH, DEFAULT_REMOTE, DEFAULT_SYNC_TIMEOUT};
pub use hook::{NoopSync, SyncHook};
