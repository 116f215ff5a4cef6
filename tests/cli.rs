//! End-to-end tests for the packer-config binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command isolated from the caller's environment and home directory
fn packer_config(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("packer-config").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("PACKER_CONFIG")
        .env_remove("PACKER_PLUGIN_PATH")
        .env_remove("RUST_LOG");
    cmd
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn test_prints_merged_configuration() {
    let home = TempDir::new().unwrap();
    let plugins = TempDir::new().unwrap();
    touch(plugins.path(), "packer-builder-cloud-xyz");
    touch(plugins.path(), "packer-builder-docker");
    touch(plugins.path(), "packer-provisioner-super-shell");
    touch(plugins.path(), "packer-helper-foo");

    let config_path = home.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"PluginMinPort": 10, "PluginMaxPort": 25, "builders": {"docker": "/opt/docker"}}"#,
    )
    .unwrap();

    let output = packer_config(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("--plugin-dir")
        .arg(plugins.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = stdout_json(&output);
    assert_eq!(json["PluginMinPort"], 10);
    assert_eq!(json["PluginMaxPort"], 25);
    assert_eq!(json["builders"]["docker"], "/opt/docker");
    assert_eq!(
        json["builders"]["cloud-xyz"],
        plugins.path().join("packer-builder-cloud-xyz").to_str().unwrap()
    );
    assert!(json["provisioners"]["super-shell"].is_string());
    assert_eq!(json["post-processors"], serde_json::json!({}));
}

#[test]
fn test_reads_config_and_plugin_path_from_environment() {
    let home = TempDir::new().unwrap();
    let plugins = TempDir::new().unwrap();
    touch(plugins.path(), "packer-post-processor-noop");

    let config_path = home.path().join("env-config.json");
    fs::write(&config_path, r#"{"disable_checkpoint": true}"#).unwrap();

    let output = packer_config(home.path())
        .env("PACKER_CONFIG", &config_path)
        .env("PACKER_PLUGIN_PATH", plugins.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = stdout_json(&output);
    assert_eq!(json["disable_checkpoint"], true);
    assert!(json["post-processors"]["noop"].is_string());
}

#[test]
fn test_stale_plugin_path_entry_is_ignored() {
    let home = TempDir::new().unwrap();
    let plugins = TempDir::new().unwrap();
    touch(plugins.path(), "packer-builder-cloud-xyz");

    let plugin_path = std::env::join_paths([
        home.path().join("removed-plugins"),
        plugins.path().to_path_buf(),
    ])
    .unwrap();

    let output = packer_config(home.path())
        .env("PACKER_PLUGIN_PATH", plugin_path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = stdout_json(&output);
    assert!(json["builders"]["cloud-xyz"].is_string());
}

#[cfg(not(windows))]
#[test]
fn test_default_config_file_in_home() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".packerconfig"), r#"{"PluginMaxPort": 99}"#).unwrap();
    let plugin_home = home.path().join(".packer.d").join("plugins");
    fs::create_dir_all(&plugin_home).unwrap();
    touch(&plugin_home, "packer-builder-home-builder");

    let output = packer_config(home.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = stdout_json(&output);
    assert_eq!(json["PluginMaxPort"], 99);
    assert!(json["builders"]["home-builder"].is_string());
}

#[test]
fn test_missing_config_yields_defaults() {
    let home = TempDir::new().unwrap();

    let output = packer_config(home.path())
        .arg("--config")
        .arg(home.path().join("nope.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = stdout_json(&output);
    assert_eq!(json["PluginMinPort"], 0);
    assert_eq!(json["disable_checkpoint"], false);
    assert_eq!(json["builders"], serde_json::json!({}));
}

#[test]
fn test_no_discovery_skips_plugins() {
    let home = TempDir::new().unwrap();
    let plugins = TempDir::new().unwrap();
    touch(plugins.path(), "packer-builder-cloud-xyz");

    packer_config(home.path())
        .arg("--no-discovery")
        .arg("--plugin-dir")
        .arg(plugins.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cloud-xyz").not());
}

#[test]
fn test_concurrent_discovery() {
    let home = TempDir::new().unwrap();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    touch(first.path(), "packer-builder-shared");
    touch(second.path(), "packer-builder-shared");

    let output = packer_config(home.path())
        .arg("--concurrent")
        .arg("--plugin-dir")
        .arg(first.path())
        .arg("--plugin-dir")
        .arg(second.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = stdout_json(&output);
    assert_eq!(
        json["builders"]["shared"],
        first.path().join("packer-builder-shared").to_str().unwrap()
    );
}

#[test]
fn test_missing_plugin_dir_fails() {
    let home = TempDir::new().unwrap();

    packer_config(home.path())
        .arg("--plugin-dir")
        .arg(home.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_invalid_config_fails() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("bad.json");
    fs::write(&config_path, r#"{"disable_checkpoint": "yes"}"#).unwrap();

    packer_config(home.path())
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode configuration"));
}
