//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("tl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auto"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("repl"));
}

#[test]
fn test_version() {
    Command::cargo_bin("tl")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_without_tasks_is_rejected() {
    Command::cargo_bin("tl")
        .unwrap()
        .args(["run", "some goal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--task"));
}

#[test]
fn test_missing_config_file_fails() {
    Command::cargo_bin("tl")
        .unwrap()
        .args(["--config", "/nonexistent/taskloop.yml", "auto", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
