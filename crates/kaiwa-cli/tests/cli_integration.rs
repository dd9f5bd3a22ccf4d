//! Integration tests for CLI behavior.
//!
//! These run the actual binary. Tests that would send prompts to a provider
//! are avoided here since they require API keys and network access; the
//! argument-to-request mapping is covered by unit tests in cli.rs and the
//! core crate.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Create a temporary KAIWA_HOME with a minimal config for testing.
/// Returns the TempDir (must be kept alive for the duration of the test).
fn setup_test_home() -> TempDir {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config_content = r#"
default_provider = "test"

[providers.test]
api_key = "test-key-not-real"
model = "test-model"
"#;
    fs::write(temp_dir.path().join("config.toml"), config_content)
        .expect("failed to write config.toml");
    temp_dir
}

fn kaiwa() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kaiwa"))
}

#[test]
fn integration_help_flag() {
    let output = kaiwa().arg("--help").output().expect("failed to run kaiwa");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kaiwa"));
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("--provider"));
}

#[test]
fn integration_version_flag() {
    let output = kaiwa()
        .arg("--version")
        .output()
        .expect("failed to run kaiwa");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kaiwa"));
}

#[test]
fn integration_missing_config_reports_configuration_error() {
    let temp_home = TempDir::new().unwrap();
    // No config.toml written.
    let output = kaiwa()
        .args(["hello"])
        .env("KAIWA_HOME", temp_home.path())
        .output()
        .expect("failed to run kaiwa");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read"), "stderr: {}", stderr);
}

#[test]
fn integration_unknown_provider_reports_configuration_error() {
    let temp_home = setup_test_home();
    let output = kaiwa()
        .args(["--provider", "nonexistent", "hello"])
        .env("KAIWA_HOME", temp_home.path())
        .output()
        .expect("failed to run kaiwa");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "stderr: {}", stderr);
}

#[test]
fn integration_no_prompt_on_empty_stdin_fails() {
    use std::process::Stdio;

    let temp_home = setup_test_home();
    let output = kaiwa()
        .env("KAIWA_HOME", temp_home.path())
        .stdin(Stdio::null())
        .output()
        .expect("failed to run kaiwa");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("prompt"),
        "stderr should mention the missing prompt, got: {}",
        stderr
    );
}
