//! Integration tests for the binddiag binary surface
//!
//! These run the actual binary and verify the CLI contract without
//! starting the server.

use assert_cmd::Command;
use predicates::prelude::*;

fn binddiag_cmd() -> Command {
    Command::cargo_bin("binddiag").unwrap()
}

#[test]
fn test_help_flag() {
    binddiag_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Service-binding credential and IP-routing diagnostics",
        ))
        .stdout(predicate::str::contains("--listen"));
}

#[test]
fn test_version_flag() {
    binddiag_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("binddiag"));
}

#[test]
fn test_unknown_flag_fails() {
    binddiag_cmd().arg("--definitely-not-a-flag").assert().failure();
}

#[test]
fn test_unbindable_listen_address_fails() {
    // Port 1 needs privileges; bind fails before the server starts serving.
    binddiag_cmd()
        .args(["--listen", "256.256.256.256:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to bind"));
}
