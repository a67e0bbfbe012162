//! CLI end-to-end tests
//!
//! Tests for the reelforged command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the reelforged binary with a clean environment
#[allow(deprecated)]
fn reelforged_cmd() -> Command {
    let mut cmd = Command::cargo_bin("reelforged").unwrap();
    for var in [
        "REELFORGED_CONFIG",
        "REELFORGED_OUTPUT_DIR",
        "REELFORGED_TTS_API_KEY",
        "REELFORGED_OAUTH_TOKEN_B64",
        "REELFORGED_OAUTH_CLIENT_JSON",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Config whose fetch endpoint refuses connections, so every topic skips.
fn unreachable_config(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("reelforged.toml");
    let images = dir.join("images");
    fs::create_dir_all(&images).unwrap();
    fs::write(
        &path,
        format!(
            "[fetch]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n\n[assets]\nimages_dir = {:?}\n",
            images
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_cli_help_flag() {
    reelforged_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelforged"))
        .stdout(predicate::str::contains("REELFORGED_TTS_API_KEY"))
        .stdout(predicate::str::contains("--skip-upload"));
}

#[test]
fn test_cli_version_flag() {
    reelforged_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelforged"));
}

#[test]
fn test_cli_version_command() {
    reelforged_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("reelforged "));
}

#[test]
fn test_cli_check_tools_command() {
    // Passes whether or not ffmpeg is installed.
    reelforged_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("reelforged.toml");
    fs::write(&config, "[render]\npad_secs = 0.5\n\n[upload]\nprivacy = \"unlisted\"\n").unwrap();

    reelforged_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("unlisted"));
}

#[test]
fn test_cli_validate_rejects_bad_chunk_size() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("reelforged.toml");
    fs::write(&config, "[upload]\nchunk_size = 1000\n").unwrap();

    reelforged_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_cli_run_with_everything_skipped_exits_zero() {
    let dir = tempdir().unwrap();
    let config = unreachable_config(dir.path());
    let out = dir.path().join("out");

    reelforged_cmd()
        .env("REELFORGED_CONFIG", &config)
        .env("REELFORGED_OUTPUT_DIR", &out)
        .arg("--skip-upload")
        .assert()
        .success()
        .stdout(predicate::str::contains("Run aborted"));

    assert!(!out.join("daily_horoscope_compilation.mp4").exists());
}

#[test]
fn test_cli_run_removes_materialized_credentials() {
    let dir = tempdir().unwrap();
    let config = unreachable_config(dir.path());
    let out = dir.path().join("out");

    reelforged_cmd()
        .args(["--config", config.to_str().unwrap()])
        .env("REELFORGED_OUTPUT_DIR", &out)
        .env("REELFORGED_OAUTH_TOKEN_B64", "eyJ0b2tlbiI6ICJ0In0=")
        .env("REELFORGED_OAUTH_CLIENT_JSON", r#"{"installed": {}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Run aborted"));

    assert!(!out.join("token.json").exists());
    assert!(!out.join("client_secret.json").exists());
}

#[test]
fn test_cli_unreadable_config_exits_zero() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[render\n").unwrap();

    reelforged_cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Run aborted"));
}
