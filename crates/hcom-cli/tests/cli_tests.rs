//! Integration tests for CLI argument handling
//!
//! These run without a cluster: they exercise flag validation, which
//! happens before any connection attempt, and the help surface.

use std::process::Command;

/// Helper to run the hcom binary
fn hcom(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hcom"))
        .args(args)
        .output()
        .expect("Failed to execute hcom")
}

#[test]
fn test_help_lists_subcommands() {
    let output = hcom(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["list", "info", "history", "drift", "source", "updates", "doctor"] {
        assert!(
            stdout.contains(subcommand),
            "help should mention '{}'",
            subcommand
        );
    }
}

#[test]
fn test_invalid_filter_regex_is_invocation_error() {
    let output = hcom(&["list", "--filter", "["]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("filter"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_only_value_is_invocation_error() {
    let output = hcom(&["list", "--only", "bogus"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bogus"), "stderr: {}", stderr);
}

#[test]
fn test_updates_rejects_bad_filter() {
    let output = hcom(&["updates", "--filter", "(unclosed"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = hcom(&["install", "something"]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_release_name_fails() {
    let output = hcom(&["info"]);
    assert!(!output.status.success());
}
