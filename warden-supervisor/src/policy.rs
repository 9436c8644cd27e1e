use std::time::Duration;

use warden_core::DEFAULT_JAVA_RUNTIME;

/// How long the server gets to save and exit after the stop command.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(15);

/// Upper bound for reaping the process after the forced kill.
pub const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(10);

/// Console command that asks the server to save and shut down.
pub const STOP_TOKEN: &str = "stop";

pub const COMMIT_MESSAGE: &str = "World update after server stop";

/// What the grace wait does when the process exits before the window ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraceWait {
    /// Always consume the whole window.
    #[default]
    Full,
    /// Move on as soon as the process has exited.
    UntilExit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPolicy {
    pub grace: Duration,
    pub wait: GraceWait,
    pub kill_timeout: Duration,
    pub stop_token: String,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE_WINDOW,
            wait: GraceWait::default(),
            kill_timeout: DEFAULT_KILL_TIMEOUT,
            stop_token: STOP_TOKEN.to_owned(),
        }
    }
}

/// Supervisor tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Program used for the synthesized launch command.
    pub java_runtime: String,
    pub commit_message: String,
    pub stop_policy: StopPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            java_runtime: DEFAULT_JAVA_RUNTIME.to_owned(),
            commit_message: COMMIT_MESSAGE.to_owned(),
            stop_policy: StopPolicy::default(),
        }
    }
}
