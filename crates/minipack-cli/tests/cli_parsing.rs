//! CLI parsing tests for the minipack command
//!
//! Tests that verify CLI argument parsing works correctly.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the minipack binary
fn minipack() -> Command {
    Command::cargo_bin("minipack").expect("Failed to find minipack binary")
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_shows_all_commands() {
    minipack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("optimize"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn test_version_flag() {
    minipack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("minipack"));
}

// ============================================================================
// Global Options Tests
// ============================================================================

#[test]
fn test_global_options_in_help() {
    minipack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--quiet"));
}

#[test]
fn test_missing_subcommand_fails() {
    minipack().assert().failure();
}

// ============================================================================
// Optimize Command Tests
// ============================================================================

#[test]
fn test_optimize_help() {
    minipack()
        .args(["optimize", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--copy-dir"))
        .stdout(predicate::str::contains("--log-file"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_optimize_requires_output_root() {
    minipack().arg("optimize").assert().failure();
}

// ============================================================================
// Analyze Command Tests
// ============================================================================

#[test]
fn test_analyze_help() {
    minipack()
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_analyze_requires_output_root() {
    minipack().arg("analyze").assert().failure();
}
