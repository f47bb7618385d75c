//! Tests for loading engine config files.

use noughts::{EngineConfig, RedoStatus};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_from_file_reads_all_keys() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("noughts.toml");
    fs::write(
        &path,
        r#"opponent_delay_ms = 250
tick_interval_ms = 100
redo_status = "recompute"
seed = 42
"#,
    )
    .expect("Failed to write TOML");

    let config = EngineConfig::from_file(&path).expect("Config should load");
    assert_eq!(config.opponent_delay(), Duration::from_millis(250));
    assert_eq!(config.tick_interval(), Duration::from_millis(100));
    assert_eq!(*config.redo_status(), RedoStatus::Recompute);
    assert_eq!(*config.seed(), Some(42));
}

#[test]
fn test_from_file_missing_keys_take_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("noughts.toml");
    fs::write(&path, "tick_interval_ms = 0\n").expect("Failed to write TOML");

    let config = EngineConfig::from_file(&path).expect("Config should load");
    assert_eq!(config.opponent_delay(), Duration::from_millis(500));
    assert_eq!(config.tick_interval(), Duration::from_millis(1));
    assert_eq!(*config.redo_status(), RedoStatus::AlwaysIncomplete);
    assert_eq!(*config.seed(), None);
}

#[test]
fn test_from_file_missing_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let err = EngineConfig::from_file(dir.path().join("absent.toml")).expect_err("No file");
    assert!(err.message.starts_with("Failed to read config file"));
}

#[test]
fn test_from_file_bad_toml() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "opponent_delay_ms = \"soon\"\n").expect("Failed to write TOML");

    let err = EngineConfig::from_file(&path).expect_err("Wrong type");
    assert!(err.message.starts_with("Failed to parse config"));
}
