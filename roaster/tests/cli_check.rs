//! CLI tests for `roaster check`.
//!
//! Spawns the roaster binary against a prepared checkout and verifies the
//! printed answer and exit codes.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, SystemTime};

use filetime::{FileTime, set_file_mtime};
use roaster::exit_codes;
use roaster::test_support::entry;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn write_entry(checkout: &Path, name: &str, body: &str, age: Duration) {
    let dir = checkout.join("content/blog");
    fs::create_dir_all(&dir).expect("mkdir");
    let path = dir.join(name);
    fs::write(&path, body).expect("write");
    set_file_mtime(&path, FileTime::from_system_time(SystemTime::now() - age)).expect("mtime");
}

fn check(checkout: &Path, handle: &str) -> (Option<i32>, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_roaster"))
        .current_dir(checkout)
        .args(["check", "--handle", handle, "--dir"])
        .arg(checkout)
        .output()
        .expect("roaster check");
    (
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
    )
}

#[test]
fn recent_entry_exits_ok() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_entry(temp.path(), "week-1.md", &entry("alice", false), DAY);

    assert_eq!(check(temp.path(), "alice"), (Some(exit_codes::OK), "true".to_string()));
}

#[test]
fn stale_or_foreign_entries_exit_with_no_recent_entry() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_entry(temp.path(), "old.md", &entry("alice", false), DAY * 8);
    write_entry(temp.path(), "bob.md", &entry("bob", false), DAY);

    assert_eq!(
        check(temp.path(), "alice"),
        (Some(exit_codes::NO_RECENT_ENTRY), "false".to_string())
    );
}

#[test]
fn malformed_recent_entry_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_entry(temp.path(), "broken.md", "+++\ntitle = \n+++\n", DAY);

    let (code, stdout) = check(temp.path(), "alice");
    assert_eq!(code, Some(exit_codes::FAILED));
    assert!(stdout.is_empty());
}

#[test]
fn config_file_changes_the_window() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_entry(temp.path(), "week-1.md", &entry("alice", false), DAY * 2);
    fs::write(temp.path().join("roaster.toml"), "[gate]\nwindow_secs = 86400\n").expect("config");

    assert_eq!(
        check(temp.path(), "alice"),
        (Some(exit_codes::NO_RECENT_ENTRY), "false".to_string())
    );
}
