//! Lifecycle supervision of a single game server process.
//!
//! [`Supervisor`] owns the process slot and the state machine; it calls into a
//! [`warden_sync::SyncHook`] around start/stop and a [`Launcher`] to spawn.

mod error;
pub mod logging;
pub mod policy;
pub mod process;
mod state;
mod supervisor;

pub use error::{ProcessError, SupervisorError};
pub use logging::{init_tracing, LogFormat};
pub use policy::{GraceWait, StopPolicy, SupervisorConfig, DEFAULT_GRACE_WINDOW};
pub use process::{ChildLauncher, ChildProcess, Launcher, ProcessHandle, WaitOutcome};
pub use state::{StartReport, StopReport, SupervisorState, SyncStatus};
pub use supervisor::{Supervisor, SupervisorBuilder};
