//! Warden core library: settings model, launch command synthesis, persistence.
//!
//! Public API surface:
//! - [`types`]: [`Settings`], [`MemoryMb`], [`LaunchCommand`]
//! - [`error`]: [`ConfigError`]
//! - [`store`]: [`ConfigStore`] plus the [`PathResolver`] / [`SettingsStore`] seams

pub mod error;
pub mod store;
pub mod types;

pub use error::ConfigError;
pub use store::{ConfigStore, PathResolver, SettingsStore};
pub use types::{LaunchCommand, MemoryMb, Settings, DEFAULT_JAVA_RUNTIME, DEFAULT_RAM};
