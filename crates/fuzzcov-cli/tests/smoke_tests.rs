//! Smoke tests for the fuzzcov CLI
//!
//! These tests run the real binary against temporary profile stores.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command for the fuzzcov binary with a clean environment
fn fuzzcov() -> Command {
    let mut cmd = Command::cargo_bin("fuzzcov").expect("fuzzcov binary should exist");
    for var in [
        "SANITIZER",
        "FUZZING_LANGUAGE",
        "FUZZCOV_POLICY",
        "FUZZCOV_STORE",
        "FUZZCOV_REPORT_ROOT",
        "FUZZCOV_LOG_JSON",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn lcov_for(path: &str, lines: std::ops::RangeInclusive<u32>) -> String {
    let mut out = format!("SF:{path}\n");
    for line in lines {
        out.push_str(&format!("DA:{line},1\n"));
    }
    out.push_str("end_of_record\n");
    out
}

/// Store with a healthy `libfoo` project
fn store() -> TempDir {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("libfoo");
    write(&project.join("coverage/t1.lcov"), &lcov_for("/src/p/a.c", 1..=10));
    write(&project.join("coverage/t2.lcov"), &lcov_for("./p/a.c", 5..=15));
    write(&project.join("profiles/t1.cpu.folded"), "main;f 2\n");
    dir
}

fn policy(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("policy.yaml");
    fs::write(&path, "projects:\n  libpng: [introspector]\n").unwrap();
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    fuzzcov()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_lists_subcommands() {
    fuzzcov()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("aggregate"))
        .stdout(predicate::str::contains("gate"))
        .stdout(predicate::str::contains("patch"));
}

#[test]
fn test_no_args_fails() {
    fuzzcov().assert().failure();
}

// ============================================================================
// Aggregate
// ============================================================================

#[test]
fn test_aggregate_single_project() {
    let store = store();
    let reports = TempDir::new().unwrap();

    fuzzcov()
        .args(["aggregate", "--format", "lcov", "--project", "libfoo", "--store"])
        .arg(store.path())
        .arg("--report-root")
        .arg(reports.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("lines 15/15"));

    let out = reports.path().join("libfoo");
    let summary = fs::read_to_string(out.join("summary.txt")).unwrap();
    assert!(summary.contains("p/a.c  lines 15/15 (100.00%)"));
    let html = fs::read_to_string(out.join("report/index.html")).unwrap();
    assert_eq!(html.matches("id=\"fuzzcov-navigation\"").count(), 1);
    assert!(out.join("merged.lcov").exists());
    assert!(out.join("merged.covdata").exists());
    assert!(out.join("profiling/merged.cpu.folded").exists());
}

#[test]
fn test_aggregate_language_from_env() {
    let store = store();
    let reports = TempDir::new().unwrap();

    fuzzcov()
        .env("FUZZING_LANGUAGE", "rust")
        .args(["aggregate", "--store"])
        .arg(store.path())
        .arg("--report-root")
        .arg(reports.path())
        .assert()
        .success();
    assert!(reports.path().join("libfoo/summary.json").exists());
}

#[test]
fn test_aggregate_without_language_fails() {
    let store = store();
    fuzzcov()
        .args(["aggregate", "--store"])
        .arg(store.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FUZZING_LANGUAGE"));
}

#[test]
fn test_fleet_failure_is_isolated() {
    let store = store();
    write(&store.path().join("broken/coverage/t1.lcov"), "not lcov\n");
    let reports = TempDir::new().unwrap();

    fuzzcov()
        .args(["aggregate", "--format", "lcov", "--store"])
        .arg(store.path())
        .arg("--report-root")
        .arg(reports.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("libfoo"))
        .stderr(predicate::str::contains("1 of 2 projects failed"));

    assert!(reports.path().join("libfoo/report/index.html").exists());
    assert!(!reports.path().join("broken").exists());
}

#[test]
fn test_aggregate_json_output() {
    let store = store();
    let reports = TempDir::new().unwrap();

    let output = fuzzcov()
        .args(["aggregate", "--format", "lcov", "--json", "--store"])
        .arg(store.path())
        .arg("--report-root")
        .arg(reports.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["project"], "libfoo");
    assert_eq!(value[0]["ok"], true);
    assert_eq!(value[0]["report"]["lines"]["covered"], 15);
}

// ============================================================================
// Gate and build
// ============================================================================

#[test]
fn test_gate_skip_exit_code() {
    let dir = TempDir::new().unwrap();
    fuzzcov()
        .args(["gate", "--project", "libpng", "--mode", "introspector", "--policy"])
        .arg(policy(dir.path()))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("skipping"));
}

#[test]
fn test_gate_supported_mode() {
    let dir = TempDir::new().unwrap();
    fuzzcov()
        .args(["gate", "--project", "libpng", "--policy"])
        .arg(policy(dir.path()))
        .env("SANITIZER", "address")
        .assert()
        .success();
}

#[test]
fn test_gate_unknown_mode_is_failure_not_skip() {
    fuzzcov()
        .args(["gate", "--project", "libpng", "--mode", "bogus"])
        .assert()
        .code(1);
}

#[test]
fn test_gate_missing_policy_file_fails() {
    let dir = TempDir::new().unwrap();
    fuzzcov()
        .args(["gate", "--project", "libpng", "--mode", "address"])
        .env("FUZZCOV_POLICY", dir.path().join("typo.yaml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("typo.yaml"));
}

#[cfg(unix)]
#[test]
fn test_build_fast_fail_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.o");
    fuzzcov()
        .args(["build", "--project", "libpng", "--mode", "introspector", "--policy"])
        .arg(policy(dir.path()))
        .arg("--")
        .args(["sh", "-c"])
        .arg(format!("touch {}", output.display()))
        .assert()
        .code(3);
    assert!(!output.exists());
}

#[cfg(unix)]
#[test]
fn test_build_runs_and_propagates_status() {
    let dir = TempDir::new().unwrap();
    fuzzcov()
        .args(["build", "--project", "libpng", "--mode", "address", "--policy"])
        .arg(policy(dir.path()))
        .args(["--", "sh", "-c", "exit 5"])
        .assert()
        .code(5);
}

#[cfg(unix)]
#[test]
fn test_build_failure_never_reports_skip() {
    let dir = TempDir::new().unwrap();
    fuzzcov()
        .args(["build", "--project", "libpng", "--mode", "address", "--policy"])
        .arg(policy(dir.path()))
        .args(["--", "sh", "-c", "exit 3"])
        .assert()
        .code(1);
}

// ============================================================================
// Patch and config
// ============================================================================

#[test]
fn test_patch_twice() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("index.html");
    fs::write(
        &file,
        "<!DOCTYPE html>\n<html>\n<head><title>r</title></head>\n<body>\n</body>\n</html>\n",
    )
    .unwrap();

    fuzzcov()
        .arg("patch")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("navigation added"));
    fuzzcov()
        .arg("patch")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("already has navigation"));

    let html = fs::read_to_string(&file).unwrap();
    assert_eq!(html.matches("id=\"fuzzcov-navigation\"").count(), 1);
}

#[test]
fn test_patch_refuses_malformed() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("index.html");
    fs::write(&file, "<html><body><div></body></html>").unwrap();

    fuzzcov()
        .arg("patch")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("refused"));
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "<html><body><div></body></html>"
    );
}

#[test]
fn test_config_json() {
    fuzzcov()
        .env("FUZZING_LANGUAGE", "c++")
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("llvm-json (llvm-cov)"));
}
