//! CLI argument parsing tests

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn concierge() -> Command {
    Command::new(env!("CARGO_BIN_EXE_concierge"))
}

#[test]
fn test_help_flag() {
    concierge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Booking assistant"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("conversations"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn test_version_flag() {
    concierge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_no_args_shows_usage() {
    concierge()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_chat_help_lists_flags() {
    concierge()
        .args(["chat", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--message"))
        .stdout(predicate::str::contains("--conversation"))
        .stdout(predicate::str::contains("--no-tools"))
        .stdout(predicate::str::contains("--rag"));
}

#[test]
fn test_conversations_requires_subcommand() {
    concierge()
        .arg("conversations")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_conversations_show_requires_id() {
    concierge()
        .args(["conversations", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<ID>"));
}

#[test]
fn test_unknown_subcommand() {
    concierge()
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
