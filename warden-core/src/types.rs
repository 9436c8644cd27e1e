//! Domain types for the persisted server settings.
//!
//! All path fields use `PathBuf`. The settings record serializes to a flat
//! JSON object whose key names (`server_path`, `ram`, `start_command`) are
//! stable across versions.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Memory value written on first run, in megabytes.
pub const DEFAULT_RAM: &str = "2048";

/// Java runtime used for the synthesized launch command.
pub const DEFAULT_JAVA_RUNTIME: &str = "java";

/// Name of the world folder inside the server data path.
pub const WORLD_DIR: &str = "world";

// ---------------------------------------------------------------------------
// MemoryMb
// ---------------------------------------------------------------------------

/// A validated, strictly positive memory allocation in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryMb(NonZeroU32);

impl MemoryMb {
    /// Parse an operator-supplied value.
    ///
    /// Surrounding whitespace is ignored; anything else that is not a run of
    /// ASCII digits denoting a value in `1..=u32::MAX` is rejected, including
    /// signs, decimals, and the empty string.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidMemory {
            value: value.to_owned(),
        };
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or_else(invalid)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl FromStr for MemoryMb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MemoryMb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// LaunchCommand
// ---------------------------------------------------------------------------

/// The resolved, non-empty token list used to spawn the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand(Vec<String>);

impl LaunchCommand {
    pub fn new(tokens: Vec<String>) -> Result<Self, ConfigError> {
        if tokens.is_empty() {
            return Err(ConfigError::EmptyLaunchCommand);
        }
        Ok(Self(tokens))
    }

    /// `[java, -Xmx<N>M, -Xms<N>M, -jar, server.jar, nogui]`
    pub fn default_for(java_runtime: &str, memory: MemoryMb) -> Self {
        Self(vec![
            java_runtime.to_owned(),
            format!("-Xmx{memory}M"),
            format!("-Xms{memory}M"),
            "-jar".to_owned(),
            "server.jar".to_owned(),
            "nogui".to_owned(),
        ])
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The persisted settings record.
///
/// `ram` is kept as the raw operator value and validated on use, so a bad
/// value on disk surfaces as [`ConfigError::InvalidMemory`] at start time
/// rather than as a parse failure of the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, alias = "dataPath", skip_serializing_if = "Option::is_none")]
    pub server_path: Option<PathBuf>,

    #[serde(
        default = "default_ram",
        alias = "memoryAllocationMB",
        deserialize_with = "ram_from_json"
    )]
    pub ram: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_command: Option<Vec<String>>,

    /// Keys this version does not know about, preserved on rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_path: None,
            ram: default_ram(),
            start_command: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Settings for `server_path` with the given raw memory value.
    pub fn new(server_path: impl Into<PathBuf>, ram: impl Into<String>) -> Self {
        Self {
            server_path: Some(server_path.into()),
            ram: ram.into(),
            ..Self::default()
        }
    }

    /// The configured data path, if set and non-empty.
    pub fn data_path(&self) -> Option<&Path> {
        self.server_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// `<server_path>/world`, if a data path is set.
    pub fn world_dir(&self) -> Option<PathBuf> {
        self.data_path().map(|p| p.join(WORLD_DIR))
    }

    pub fn memory(&self) -> Result<MemoryMb, ConfigError> {
        MemoryMb::parse(&self.ram)
    }

    /// Store a validated memory value in its canonical form.
    pub fn set_memory(&mut self, memory: MemoryMb) {
        self.ram = memory.to_string();
    }

    /// The custom launch command, ignoring an empty list.
    pub fn custom_command(&self) -> Option<&[String]> {
        self.start_command.as_deref().filter(|c| !c.is_empty())
    }

    /// Resolve the launch command: the custom `start_command` when present,
    /// otherwise the default synthesized from `ram`.
    ///
    /// The memory value is validated in both cases.
    pub fn launch_command(&self, java_runtime: &str) -> Result<LaunchCommand, ConfigError> {
        let memory = self.memory()?;
        match self.custom_command() {
            Some(tokens) => LaunchCommand::new(tokens.to_vec()),
            None => Ok(LaunchCommand::default_for(java_runtime, memory)),
        }
    }
}

fn default_ram() -> String {
    DEFAULT_RAM.to_owned()
}

/// Accept `ram` as a JSON string or number; keep it as text.
fn ram_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRam {
        Text(String),
        // Rendered as written, so `4096.0` stays non-integral and fails
        // validation.
        Number(serde_json::Number),
    }

    Ok(match RawRam::deserialize(deserializer)? {
        RawRam::Text(s) => s,
        RawRam::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_for_4096() {
        let cmd = LaunchCommand::default_for("java", MemoryMb::parse("4096").unwrap());
        assert_eq!(
            cmd.tokens(),
            ["java", "-Xmx4096M", "-Xms4096M", "-jar", "server.jar", "nogui"]
        );
        assert_eq!(cmd.program(), "java");
        assert_eq!(cmd.args().len(), 5);
    }

    #[test]
    fn fractional_json_ram_is_kept_and_rejected() {
        let settings: Settings =
            serde_json::from_str(r#"{"server_path": "/srv/mc", "ram": 4096.0}"#).unwrap();
        assert_eq!(settings.ram, "4096.0");
        assert!(matches!(
            settings.memory(),
            Err(ConfigError::InvalidMemory { .. })
        ));

        let settings: Settings = serde_json::from_str(r#"{"ram": 4096}"#).unwrap();
        assert_eq!(settings.memory().unwrap().get(), 4096);
    }

    #[test]
    fn memory_rejects_zero_sign_and_text() {
        for bad in ["0", "-1", "+5", "abc", "", "4.5", "99999999999"] {
            assert!(MemoryMb::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn memory_trims_whitespace() {
        assert_eq!(MemoryMb::parse(" 1024\n").unwrap().get(), 1024);
    }

    #[test]
    fn empty_custom_command_falls_back_to_default() {
        let mut settings = Settings::new("/srv/mc", "512");
        settings.start_command = Some(vec![]);
        let cmd = settings.launch_command("java").unwrap();
        assert_eq!(cmd.program(), "java");
        assert!(cmd.tokens().contains(&"-Xmx512M".to_string()));
    }

    #[test]
    fn custom_command_still_requires_valid_memory() {
        let mut settings = Settings::new("/srv/mc", "zero");
        settings.start_command = Some(vec!["./run.sh".into()]);
        assert!(matches!(
            settings.launch_command("java"),
            Err(ConfigError::InvalidMemory { .. })
        ));
    }

    #[test]
    fn empty_server_path_is_unset() {
        let settings = Settings::new("", "2048");
        assert!(settings.data_path().is_none());
        assert!(settings.world_dir().is_none());
    }

    #[test]
    fn world_dir_is_under_server_path() {
        let settings = Settings::new("/srv/mc", "2048");
        assert_eq!(settings.world_dir(), Some(PathBuf::from("/srv/mc/world")));
    }
}
