use std::fs;
use std::path::Path;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn warden_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("warden"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("RUST_LOG", "warn");
    cmd
}

fn config_file(home: &Path) -> std::path::PathBuf {
    home.join(".warden").join("server_config.json")
}

fn read_config(home: &Path) -> Value {
    let raw = fs::read_to_string(config_file(home)).expect("read config");
    serde_json::from_str(&raw).expect("parse config")
}

fn write_config(home: &Path, value: &Value) {
    let path = config_file(home);
    fs::create_dir_all(path.parent().expect("parent")).expect("create .warden");
    fs::write(path, serde_json::to_string_pretty(value).expect("render")).expect("write config");
}

#[test]
fn config_show_reports_defaults_without_a_file() {
    let home = TempDir::new().expect("home");

    warden_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("\"ram\": \"2048\""))
        .stdout(contains("-Xmx2048M"))
        .stdout(contains("-Xms2048M"));
}

#[test]
fn set_ram_rejects_zero_and_leaves_no_file() {
    let home = TempDir::new().expect("home");

    warden_cmd(home.path())
        .args(["config", "set-ram", "0"])
        .assert()
        .failure()
        .stderr(contains("ram not updated"));

    assert!(!config_file(home.path()).exists());
}

#[test]
fn set_ram_changes_the_launch_command() {
    let home = TempDir::new().expect("home");

    warden_cmd(home.path())
        .args(["config", "set-ram", "4096"])
        .assert()
        .success()
        .stdout(contains("4096 MB"));

    assert_eq!(read_config(home.path())["ram"], "4096");
    warden_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("-Xmx4096M").and(contains("-Xms4096M")));
}

#[test]
fn set_path_and_command_persist_and_clear() {
    let home = TempDir::new().expect("home");
    let data = TempDir::new().expect("data");

    warden_cmd(home.path())
        .args(["config", "set-path"])
        .arg(data.path())
        .assert()
        .success();
    warden_cmd(home.path())
        .args(["config", "set-command", "java", "-Xmx1G", "-jar", "paper.jar"])
        .assert()
        .success();

    let saved = read_config(home.path());
    assert_eq!(saved["server_path"], data.path().display().to_string());
    assert_eq!(
        saved["start_command"],
        serde_json::json!(["java", "-Xmx1G", "-jar", "paper.jar"])
    );

    warden_cmd(home.path())
        .args(["config", "set-command"])
        .assert()
        .success()
        .stdout(contains("reset to default"));
    assert!(read_config(home.path()).get("start_command").is_none());
}

#[cfg(unix)]
#[test]
fn run_starts_and_stops_on_console_stop() {
    let home = TempDir::new().expect("home");
    let data = TempDir::new().expect("data");
    write_config(
        home.path(),
        &serde_json::json!({
            "server_path": data.path(),
            "ram": 512,
            "start_command": ["/bin/sh", "-c", "read cmd; echo \"$cmd\" > received; exit 0"],
        }),
    );

    warden_cmd(home.path())
        .args(["run", "--no-sync", "--grace-secs", "5", "--early-exit"])
        .write_stdin("stop\n")
        .timeout(Duration::from_secs(30))
        .assert()
        .success()
        .stdout(contains("\"stop_command_delivered\": true"))
        .stdout(contains("\"exited_during_grace\": true"));

    assert_eq!(
        fs::read_to_string(data.path().join("received")).expect("received"),
        "stop\n"
    );
    // The start normalizes the integer ram to its string form.
    assert_eq!(read_config(home.path())["ram"], "512");
}

#[cfg(unix)]
#[test]
fn run_with_invalid_ram_does_not_launch() {
    let home = TempDir::new().expect("home");
    let data = TempDir::new().expect("data");
    write_config(
        home.path(),
        &serde_json::json!({
            "server_path": data.path(),
            "start_command": ["/bin/sh", "-c", "touch launched"],
        }),
    );

    warden_cmd(home.path())
        .args(["run", "--no-sync", "--ram", "lots"])
        .write_stdin("")
        .timeout(Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(contains("invalid --ram"));

    assert!(!data.path().join("launched").exists());
}
