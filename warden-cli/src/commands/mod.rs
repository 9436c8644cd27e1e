pub mod config;
pub mod run;

use anyhow::{Context, Result};
use warden_core::ConfigStore;

/// Settings store under the current user's home directory.
pub(crate) fn config_store() -> Result<ConfigStore> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(ConfigStore::at(&home))
}
