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
    cmd
}

fn visit(dir: &TempDir, url: &str, minutes_ago: i64) {
    scrubber(dir)
        .args(["history", "add", url, "--minutes-ago", &minutes_ago.to_string()])
        .assert()
        .success();
}

#[test]
fn test_clear_removes_tracked_history_in_range() {
    let dir = TempDir::new().unwrap();

    visit(&dir, "https://www.example.com/page", 5);
    visit(&dir, "https://example.com/old", 180);
    visit(&dir, "https://other.org/", 5);
    scrubber(&dir).args(["site", "add", "example.com"]).assert().success();

    scrubber(&dir)
        .args(["clear", "--range", "hour"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1 history entries"));

    scrubber(&dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com/old"))
        .stdout(predicate::str::contains("https://other.org/"))
        .stdout(predicate::str::contains("/page").not());

    scrubber(&dir)
        .args(["logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Manual clean: cleared last hour history, 1 entries",
        ))
        .stdout(predicate::str::contains("(1 entries cleared)"));
}

#[test]
fn test_clear_remembers_range() {
    let dir = TempDir::new().unwrap();

    visit(&dir, "https://example.com/old", 180);
    scrubber(&dir).args(["site", "add", "example.com"]).assert().success();

    scrubber(&dir)
        .args(["clear", "--range", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1"));

    scrubber(&dir)
        .args(["range"])
        .assert()
        .success()
        .stdout(predicate::str::contains("all"));
}

#[test]
fn test_clear_with_nothing_tracked() {
    let dir = TempDir::new().unwrap();

    visit(&dir, "https://example.com/", 1);
    scrubber(&dir)
        .args(["--format", "json", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cleared\": 0"));

    scrubber(&dir)
        .args(["logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No activity yet"));
}

#[test]
fn test_range_rejects_unknown_value() {
    let dir = TempDir::new().unwrap();

    scrubber(&dir)
        .args(["range", "fortnight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown clear range"));
}

#[test]
fn test_logs_clear() {
    let dir = TempDir::new().unwrap();

    visit(&dir, "https://example.com/", 1);
    scrubber(&dir).args(["site", "add", "example.com"]).assert().success();
    scrubber(&dir).args(["clear"]).assert().success();

    scrubber(&dir)
        .args(["logs", "--clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Activity log cleared"));

    scrubber(&dir)
        .args(["logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(0 entries cleared)"));
}
