//! Lifecycle state machine for the single supervised server.
//!
//! ```text
//! Idle ──start──▶ Starting ──spawned──▶ Running ──stop──▶ Stopping ──▶ Idle
//!   ▲                 │
//!   └── invalid / ────┘
//!       launch failed
//! ```
//!
//! Transitions are check-and-set on the `watch` channel, so an operation that
//! arrives while another is in flight is rejected rather than queued. Each
//! operation runs on its own task: dropping the caller's future does not
//! abandon a half-finished transition.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use warden_core::{Settings, SettingsStore};
use warden_sync::SyncHook;

use crate::error::SupervisorError;
use crate::policy::{GraceWait, StopPolicy, SupervisorConfig};
use crate::process::{Launcher, ProcessHandle, WaitOutcome};
use crate::state::{StartReport, StopReport, SupervisorState, SyncStatus};

/// The live process and where its world is synced to.
struct Slot {
    handle: Box<dyn ProcessHandle>,
    world_dir: PathBuf,
}

struct Shared {
    config: SupervisorConfig,
    launcher: Arc<dyn Launcher>,
    sync: Arc<dyn SyncHook>,
    store: Option<Arc<dyn SettingsStore>>,
    state_tx: watch::Sender<SupervisorState>,
    slot: Mutex<Option<Slot>>,
}

/// Owns the server process and sequences sync, launch, and shutdown.
///
/// Cheap to clone; clones drive the same server.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
}

/// Assembles a [`Supervisor`]; every collaborator is fixed before the first
/// clone can exist.
pub struct SupervisorBuilder {
    config: SupervisorConfig,
    launcher: Arc<dyn Launcher>,
    sync: Arc<dyn SyncHook>,
    store: Option<Arc<dyn SettingsStore>>,
}

impl SupervisorBuilder {
    /// Persist validated settings through `store` on every start.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Supervisor {
        let (state_tx, _) = watch::channel(SupervisorState::Idle);
        Supervisor {
            shared: Arc::new(Shared {
                config: self.config,
                launcher: self.launcher,
                sync: self.sync,
                store: self.store,
                state_tx,
                slot: Mutex::new(None),
            }),
        }
    }
}

impl Supervisor {
    pub fn builder(
        config: SupervisorConfig,
        launcher: Arc<dyn Launcher>,
        sync: Arc<dyn SyncHook>,
    ) -> SupervisorBuilder {
        SupervisorBuilder {
            config,
            launcher,
            sync,
            store: None,
        }
    }

    /// A supervisor that does not persist settings.
    pub fn new(
        config: SupervisorConfig,
        launcher: Arc<dyn Launcher>,
        sync: Arc<dyn SyncHook>,
    ) -> Self {
        Self::builder(config, launcher, sync).build()
    }

    pub fn state(&self) -> SupervisorState {
        *self.shared.state_tx.borrow()
    }

    /// State-change notifications for front ends.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.shared.state_tx.subscribe()
    }

    pub fn stop_policy(&self) -> &StopPolicy {
        &self.shared.config.stop_policy
    }

    /// Pid of the running server, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.shared
            .slot
            .lock()
            .await
            .as_ref()
            .and_then(|slot| slot.handle.id())
    }

    /// Pull the world, then launch the server described by `settings`.
    ///
    /// Rejected with [`SupervisorError::AlreadyRunning`] unless idle. On any
    /// error the supervisor is back in `Idle` with no process.
    pub async fn start(&self, settings: &Settings) -> Result<StartReport, SupervisorError> {
        self.shared
            .transition(&[SupervisorState::Idle], SupervisorState::Starting)
            .map_err(|state| SupervisorError::AlreadyRunning { state })?;

        let shared = self.shared.clone();
        let settings = settings.clone();
        let task = tokio::spawn(async move {
            let result = shared.start_sequence(&settings).await;
            shared.set_state(if result.is_ok() {
                SupervisorState::Running
            } else {
                SupervisorState::Idle
            });
            result
        });
        self.join(task).await
    }

    /// Stop the server: stop command, grace wait, terminate, kill, push.
    ///
    /// Rejected with [`SupervisorError::NotRunning`] unless running. Once
    /// begun it always runs to completion and ends in `Idle`.
    pub async fn stop(&self) -> Result<StopReport, SupervisorError> {
        self.shared
            .transition(&[SupervisorState::Running], SupervisorState::Stopping)
            .map_err(|_| SupervisorError::NotRunning)?;

        let shared = self.shared.clone();
        let task = tokio::spawn(async move {
            let result = shared.stop_sequence().await;
            shared.set_state(SupervisorState::Idle);
            result
        });
        self.join(task).await
    }

    async fn join<T>(
        &self,
        task: tokio::task::JoinHandle<Result<T, SupervisorError>>,
    ) -> Result<T, SupervisorError> {
        match task.await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "lifecycle task aborted");
                self.shared.slot.lock().await.take();
                self.shared.set_state(SupervisorState::Idle);
                Err(SupervisorError::TaskFailed(err.to_string()))
            }
        }
    }
}

impl Shared {
    /// Move to `to` if the current state is one of `from`; otherwise return
    /// the current state untouched.
    fn transition(
        &self,
        from: &[SupervisorState],
        to: SupervisorState,
    ) -> Result<(), SupervisorState> {
        let mut rejected = None;
        self.state_tx.send_if_modified(|state| {
            if from.contains(state) {
                *state = to;
                true
            } else {
                rejected = Some(*state);
                false
            }
        });
        match rejected {
            None => {
                tracing::debug!(state = %to, "supervisor state changed");
                Ok(())
            }
            Some(current) => Err(current),
        }
    }

    fn set_state(&self, to: SupervisorState) {
        self.state_tx.send_replace(to);
        tracing::debug!(state = %to, "supervisor state changed");
    }

    async fn start_sequence(&self, settings: &Settings) -> Result<StartReport, SupervisorError> {
        let memory = settings.memory()?;
        let command = settings.launch_command(&self.config.java_runtime)?;
        let (Some(data_path), Some(world_dir)) = (settings.data_path(), settings.world_dir()) else {
            return Err(warden_core::ConfigError::MissingDataPath.into());
        };

        let pull: SyncStatus = self.sync.pull(&world_dir).await.into();
        if let SyncStatus::Failed(detail) = &pull {
            tracing::warn!(world = %world_dir.display(), error = %detail, "world pull failed, starting anyway");
        }

        let settings_saved = match &self.store {
            Some(store) => {
                let mut normalized = settings.clone();
                normalized.set_memory(memory);
                match store.save(&normalized) {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to persist settings");
                        false
                    }
                }
            }
            None => false,
        };

        let handle = self
            .launcher
            .launch(&command, data_path)
            .map_err(|source| {
                tracing::error!(command = %command, error = %source, "server launch failed");
                SupervisorError::LaunchFailed {
                    command: command.clone(),
                    source,
                }
            })?;

        let pid = handle.id();
        tracing::info!(?pid, command = %command, cwd = %data_path.display(), "server started");
        *self.slot.lock().await = Some(Slot { handle, world_dir });

        Ok(StartReport {
            pid,
            command,
            pull,
            settings_saved,
        })
    }

    async fn stop_sequence(&self) -> Result<StopReport, SupervisorError> {
        let started = Instant::now();
        let Some(Slot {
            mut handle,
            world_dir,
        }) = self.slot.lock().await.take()
        else {
            return Err(SupervisorError::NotRunning);
        };
        let policy = &self.config.stop_policy;
        let pid = handle.id();

        let stop_command_delivered = match handle.write_line(&policy.stop_token).await {
            Ok(()) => {
                tracing::info!(?pid, token = %policy.stop_token, "stop command sent");
                true
            }
            Err(err) => {
                tracing::warn!(?pid, error = %err, "could not send stop command, forcing termination");
                false
            }
        };

        let mut exit_status = if stop_command_delivered {
            grace_wait(handle.as_mut(), policy).await
        } else {
            None
        };
        let exited_during_grace = exit_status.is_some();

        handle.terminate();
        if let Err(err) = handle.kill().await {
            tracing::warn!(?pid, error = %err, "forced kill failed");
        }
        if exit_status.is_none() {
            match handle.wait(policy.kill_timeout).await {
                Ok(WaitOutcome::Exited(status)) => exit_status = Some(status),
                Ok(WaitOutcome::StillRunning) => tracing::warn!(
                    ?pid,
                    timeout_secs = policy.kill_timeout.as_secs(),
                    "still running after kill, giving up"
                ),
                Err(err) => tracing::warn!(?pid, error = %err, "failed to reap server"),
            }
        }
        drop(handle);
        tracing::info!(?pid, status = ?exit_status, "server stopped");

        let push: SyncStatus = self
            .sync
            .push_all(&world_dir, &self.config.commit_message)
            .await
            .into();
        if let SyncStatus::Failed(detail) = &push {
            tracing::warn!(world = %world_dir.display(), error = %detail, "world push failed");
        }

        Ok(StopReport {
            stop_command_delivered,
            exited_during_grace,
            exit_status: exit_status.map(|s| s.to_string()),
            push,
            duration_ms: started.elapsed().as_millis(),
        })
    }
}

/// Wait for the process to exit within the grace window; under
/// [`GraceWait::Full`] the whole window is consumed either way.
async fn grace_wait(
    handle: &mut dyn ProcessHandle,
    policy: &StopPolicy,
) -> Option<std::process::ExitStatus> {
    let deadline = Instant::now() + policy.grace;
    let status = match handle.wait(policy.grace).await {
        Ok(WaitOutcome::Exited(status)) => Some(status),
        Ok(WaitOutcome::StillRunning) => None,
        Err(err) => {
            tracing::warn!(error = %err, "wait during grace window failed");
            None
        }
    };
    if policy.wait == GraceWait::Full {
        tokio::time::sleep_until(deadline).await;
    }
    status
}
