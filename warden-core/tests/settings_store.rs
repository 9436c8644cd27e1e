//! Settings file compatibility, first-run, and path-resolution integration tests.

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use assert_fs::prelude::*;
use predicates::prelude::*;
use warden_core::{ConfigError, ConfigStore, Settings};

fn store_in(home: &assert_fs::TempDir) -> ConfigStore {
    ConfigStore::at(home.path())
}

/// Pins the closure signature so it coerces to `&mut dyn PathResolver`.
fn resolver<F>(f: F) -> F
where
    F: FnMut() -> Result<Option<PathBuf>, ConfigError>,
{
    f
}

fn write_config(home: &assert_fs::TempDir, body: &str) {
    home.child(".warden/server_config.json")
        .write_str(body)
        .expect("write config");
}

// ---------------------------------------------------------------------------
// 1. First run
// ---------------------------------------------------------------------------

#[test]
fn first_load_creates_file_with_default_ram_and_resolved_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = store_in(&home);

    let settings = store
        .load(&mut resolver(|| Ok(Some(PathBuf::from("/srv/mc")))))
        .expect("load");

    assert_eq!(settings.ram, "2048");
    assert_eq!(settings.data_path(), Some(std::path::Path::new("/srv/mc")));

    let file = home.child(".warden/server_config.json");
    file.assert(predicate::path::exists());
    file.assert(predicate::str::contains("\"server_path\": \"/srv/mc\""));
    file.assert(predicate::str::contains("\"ram\": \"2048\""));
}

#[test]
fn resolver_is_asked_again_until_path_is_non_empty() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = store_in(&home);
    let attempts = Cell::new(0u32);

    let settings = store
        .load(&mut resolver(|| {
            attempts.set(attempts.get() + 1);
            Ok(match attempts.get() {
                1 => None,
                2 => Some(PathBuf::new()),
                _ => Some(PathBuf::from("/games/server")),
            })
        }))
        .expect("load");

    assert_eq!(attempts.get(), 3);
    assert_eq!(settings.server_path, Some(PathBuf::from("/games/server")));
}

#[test]
fn resolver_error_aborts_load() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = store_in(&home);

    let err = store
        .load(&mut resolver(|| {
            Err(ConfigError::PathResolution("operator closed prompt".into()))
        }))
        .unwrap_err();

    assert!(matches!(err, ConfigError::PathResolution(_)), "got: {err}");
    let saved = store.read().expect("read");
    assert!(saved.data_path().is_none(), "no empty path may be persisted");
}

#[test]
fn empty_server_path_on_disk_triggers_resolver() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, r#"{"server_path": "", "ram": "1024"}"#);

    let settings = store_in(&home)
        .load(&mut resolver(|| Ok(Some(PathBuf::from("/srv/new")))))
        .expect("load");

    assert_eq!(settings.server_path, Some(PathBuf::from("/srv/new")));
    assert_eq!(settings.ram, "1024");
}

// ---------------------------------------------------------------------------
// 2. File compatibility
// ---------------------------------------------------------------------------

#[test]
fn ram_may_be_stored_as_integer() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, r#"{"server_path": "/srv/mc", "ram": 4096}"#);

    let settings = store_in(&home).read().expect("read");
    assert_eq!(settings.ram, "4096");
    assert_eq!(settings.memory().expect("memory").get(), 4096);
}

#[test]
fn camel_case_aliases_are_accepted() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, r#"{"dataPath": "/srv/mc", "memoryAllocationMB": "3072"}"#);

    let settings = store_in(&home).read().expect("read");
    assert_eq!(settings.server_path, Some(PathBuf::from("/srv/mc")));
    assert_eq!(settings.ram, "3072");
}

#[test]
fn unknown_keys_survive_a_rewrite() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(
        &home,
        r#"{"server_path": "/srv/mc", "ram": "2048", "theme": "dark"}"#,
    );
    let store = store_in(&home);

    let mut settings = store.read().expect("read");
    settings.ram = "8192".into();
    store.save(&settings).expect("save");

    let raw = fs::read_to_string(store.path()).expect("read raw");
    assert!(raw.contains("\"theme\": \"dark\""), "got: {raw}");
    assert!(raw.contains("\"ram\": \"8192\""), "got: {raw}");
}

#[test]
fn invalid_ram_on_disk_loads_but_fails_validation() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, r#"{"server_path": "/srv/mc", "ram": "lots"}"#);

    let settings = store_in(&home).read().expect("read");
    assert!(matches!(
        settings.memory(),
        Err(ConfigError::InvalidMemory { .. })
    ));
}

#[test]
fn corrupt_json_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, "{ not json");

    let err = store_in(&home).read().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("server_config.json"));
}

#[test]
fn start_command_roundtrips_in_order() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let store = store_in(&home);
    let mut settings = Settings::new("/srv/mc", "2048");
    settings.start_command = Some(vec![
        "java".into(),
        "-XX:+UseG1GC".into(),
        "-jar".into(),
        "paper.jar".into(),
    ]);
    store.save(&settings).expect("save");

    let loaded = store.read().expect("read");
    let cmd = loaded.launch_command("java").expect("command");
    assert_eq!(cmd.tokens(), ["java", "-XX:+UseG1GC", "-jar", "paper.jar"]);
}
