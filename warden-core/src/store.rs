//! JSON settings store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.warden/
//!   server_config.json    (mode 0600, created on first load)
//! ```
//!
//! # API pattern
//!
//! [`ConfigStore::at`] takes an explicit home directory and is what tests use
//! with a `TempDir`; [`ConfigStore::open`] derives home from
//! `dirs::home_dir()` and delegates to it.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::Settings;

pub const WARDEN_DIR: &str = ".warden";
pub const CONFIG_FILE: &str = "server_config.json";

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Supplies a server data path when none is configured.
///
/// Implemented by whatever front end prompts the operator. Returning
/// `Ok(None)` (or an empty path) means "nothing chosen" and the store asks
/// again; returning an error aborts the load.
pub trait PathResolver {
    fn resolve_data_path(&mut self) -> Result<Option<PathBuf>, ConfigError>;
}

impl<F> PathResolver for F
where
    F: FnMut() -> Result<Option<PathBuf>, ConfigError>,
{
    fn resolve_data_path(&mut self) -> Result<Option<PathBuf>, ConfigError> {
        self()
    }
}

/// Persists settings on behalf of the supervisor.
pub trait SettingsStore: Send + Sync {
    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `<home>/.warden/server_config.json`.
    pub fn at(home: &Path) -> Self {
        Self {
            path: home.join(WARDEN_DIR).join(CONFIG_FILE),
        }
    }

    /// Store rooted at the current user's home directory.
    pub fn open() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(Self::at(&home))
    }

    /// Store backed by an explicit settings file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, creating the file with defaults on first run and asking
    /// `resolver` until it yields a non-empty data path if none is set.
    pub fn load(&self, resolver: &mut dyn PathResolver) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "creating default settings file");
            self.save(&Settings::default())?;
        }

        let mut settings = self.read()?;
        if settings.data_path().is_some() {
            return Ok(settings);
        }

        loop {
            match resolver.resolve_data_path()? {
                Some(path) if !path.as_os_str().is_empty() => {
                    settings.server_path = Some(path);
                    break;
                }
                _ => tracing::warn!("a server folder must be selected"),
            }
        }
        self.save(&settings)?;
        Ok(settings)
    }

    /// Read settings without prompting or writing.
    ///
    /// A missing file yields [`Settings::default`].
    pub fn read(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Like [`read`](Self::read) but fails if no data path is configured.
    pub fn read_configured(&self) -> Result<Settings, ConfigError> {
        let settings = self.read()?;
        if settings.data_path().is_none() {
            return Err(ConfigError::MissingDataPath);
        }
        Ok(settings)
    }

    /// Atomically write settings.
    ///
    /// Write flow: serialize → `.json.tmp` sibling → `chmod 0600` → `rename`.
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
                set_dir_permissions(dir)?;
            }
        }
        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&tmp_path, json)?;
        set_file_permissions(&tmp_path)?;
        std::fs::rename(&tmp_path, &self.path)?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

impl SettingsStore for ConfigStore {
    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        ConfigStore::save(self, settings)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_home() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    fn never_called() -> Result<Option<PathBuf>, ConfigError> {
        panic!("resolver must not be consulted when a path is configured")
    }

    #[test]
    fn config_path_is_correct() {
        let home = make_home();
        let store = ConfigStore::at(home.path());
        assert!(store.path().ends_with(".warden/server_config.json"));
    }

    #[test]
    fn save_and_read_roundtrip() {
        let home = make_home();
        let store = ConfigStore::at(home.path());
        let mut settings = Settings::new("/srv/mc", "4096");
        settings.start_command = Some(vec!["./start.sh".into(), "--fast".into()]);
        store.save(&settings).expect("save");
        assert_eq!(store.read().expect("read"), settings);
    }

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let home = make_home();
        let store = ConfigStore::at(home.path());
        store.save(&Settings::default()).expect("save");
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn load_skips_resolver_when_path_set() {
        let home = make_home();
        let store = ConfigStore::at(home.path());
        store.save(&Settings::new("/srv/mc", "1024")).expect("save");
        let loaded = store.load(&mut never_called).expect("load");
        assert_eq!(loaded.data_path(), Some(Path::new("/srv/mc")));
    }

    #[test]
    fn read_missing_file_is_default() {
        let home = make_home();
        let store = ConfigStore::at(home.path());
        assert_eq!(store.read().expect("read"), Settings::default());
        assert!(!store.path().exists(), "read must not create the file");
    }

    #[test]
    fn read_configured_requires_path() {
        let home = make_home();
        let store = ConfigStore::at(home.path());
        store.save(&Settings::default()).expect("save");
        let err = store.read_configured().unwrap_err();
        assert!(matches!(err, ConfigError::MissingDataPath));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let home = make_home();
        let store = ConfigStore::at(home.path());
        store.save(&Settings::default()).expect("save");
        let mode = std::fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }
}
