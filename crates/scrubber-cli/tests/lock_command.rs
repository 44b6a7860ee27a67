use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn get_scrubber_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("scrubber")
}

fn scrubber(dir: &TempDir) -> Command {
    let mut cmd = Command::new(get_scrubber_bin());
    cmd.arg("--data-dir").arg(dir.path());
    cmd.env_remove("SCRUBBER_PASSWORD");
    cmd
}

#[test]
fn test_lock_command_help() {
    let mut cmd = Command::new(get_scrubber_bin());
    cmd.arg("lock").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Manage the password lock"))
        .stdout(predicate::str::contains("set-password"))
        .stdout(predicate::str::contains("unlock"))
        .stdout(predicate::str::contains("timeout"));
}

#[test]
fn test_status_without_password() {
    let dir = TempDir::new().unwrap();

    scrubber(&dir)
        .args(["lock", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no password set"))
        .stdout(predicate::str::contains("300 second"));
}

#[test]
fn test_lock_now_without_password_fails() {
    let dir = TempDir::new().unwrap();

    scrubber(&dir)
        .args(["lock", "now"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No password has been set"));
}

#[test]
fn test_password_gates_commands() {
    let dir = TempDir::new().unwrap();

    scrubber(&dir)
        .args(["lock", "set-password", "--password", "hunter2", "--hint", "classic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locked"));

    scrubber(&dir)
        .args(["site", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));

    scrubber(&dir)
        .args(["lock", "hint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("classic"))
        .stdout(predicate::str::contains("hunter2").not());

    scrubber(&dir)
        .args(["lock", "unlock", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incorrect password"));

    scrubber(&dir)
        .args(["site", "list"])
        .assert()
        .failure();

    scrubber(&dir)
        .args(["lock", "unlock", "--password", "hunter2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unlocked"));

    scrubber(&dir).args(["site", "list"]).assert().success();

    scrubber(&dir).args(["lock", "now"]).assert().success();
    scrubber(&dir)
        .args(["site", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));
}

#[test]
fn test_set_password_twice_fails() {
    let dir = TempDir::new().unwrap();

    scrubber(&dir)
        .args(["lock", "set-password", "--password", "one"])
        .assert()
        .success();

    scrubber(&dir)
        .args(["lock", "set-password", "--password", "two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already set"));
}

#[test]
fn test_change_password() {
    let dir = TempDir::new().unwrap();

    scrubber(&dir)
        .args(["lock", "set-password", "--password", "one"])
        .assert()
        .success();

    scrubber(&dir)
        .args(["lock", "change-password", "--old", "nope", "--new", "two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incorrect password"));

    scrubber(&dir)
        .args(["lock", "change-password", "--old", "one", "--new", "two"])
        .assert()
        .success();

    scrubber(&dir)
        .args(["lock", "unlock", "--password", "one"])
        .assert()
        .failure();
    scrubber(&dir)
        .args(["lock", "unlock", "--password", "two"])
        .assert()
        .success();
}

#[test]
fn test_timeout_must_be_positive() {
    let dir = TempDir::new().unwrap();

    scrubber(&dir)
        .args(["lock", "timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive"));

    scrubber(&dir)
        .args(["--format", "json", "lock", "timeout", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"lockTime\": 120"));
}
