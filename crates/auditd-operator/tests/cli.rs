use std::path::Path;
use std::process::{Command, Output};

fn operator(settings: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_auditd-operator"))
        .arg("--settings")
        .arg(settings)
        .args(args)
        .env_remove("AUDITD_OPERATOR_SETTINGS")
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

fn write_settings(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("auditd-operator.toml");
    let content = format!(
        "[status]\nfile = \"{}\"\n",
        dir.join("status.json").display()
    );
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_missing_settings_file_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = operator(&dir.path().join("missing.toml"), &["status"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_unknown_event_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let output = operator(&settings, &["hook", "start"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_malformed_override_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let options = dir.path().join("options.toml");
    std::fs::write(&options, "num_logs = 5\n").unwrap();

    let output = operator(
        &settings,
        &[
            "hook",
            "update-status",
            "--options",
            options.to_str().unwrap(),
            "--set",
            "num_logs",
        ],
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_status_without_record_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());

    let output = operator(&settings, &["status"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_status_prints_last_record() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    std::fs::write(
        dir.path().join("status.json"),
        r#"{"status":"blocked","message":"Invalid config. Please check the operator log.","event":"config-changed","updated_at":"2026-01-05T10:00:00Z"}"#,
    )
    .unwrap();

    let output = operator(&settings, &["status"]);
    assert_eq!(output.status.code(), Some(0));

    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["status"], "blocked");
    assert_eq!(printed["event"], "config-changed");
}
