//! Integration tests for the weft CLI
//!
//! These tests run the actual binary against workflow files in a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the binary to test
fn weft_cmd() -> Command {
    Command::cargo_bin("weft").unwrap()
}

const CONFIG: &str = r#"
killName: kill
killMessage: "Workflow $$name$$ failed"
actionTypes:
  - name: shell
    tag: shell
    xmlns: "uri:oozie:shell-action:0.3"
    defaultArgs:
      exec: ["$$script$$"]
    defaultInterpolations:
      script: run.sh
"#;

const NIGHTLY: &str = r#"
name: nightly
actions:
  - {name: extract, type: shell}
  - {name: load, type: shell, dependencies: [extract]}
  - {name: report, type: shell}
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help_flag() {
    weft_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Oozie workflow XML"));
}

#[test]
fn test_compile_help() {
    weft_cmd()
        .args(["compile", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--graphviz"))
        .stdout(predicate::str::contains("--low-priority-config"));
}

#[test]
fn test_input_is_required() {
    weft_cmd().arg("compile").assert().failure();
}

// ============================================================================
// compile
// ============================================================================

#[test]
fn test_compile_writes_xml_next_to_input() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    let workflow = write(temp_dir.path(), "nightly.yaml", NIGHTLY);

    weft_cmd()
        .args(["compile", "-c", arg(&config), "-i", arg(&workflow)])
        .assert()
        .success()
        .stdout(predicate::str::contains("nightly"));

    let xml = fs::read_to_string(temp_dir.path().join("nightly.xml")).unwrap();
    assert!(xml.contains("<!-- nightly workflow autogenerated by weft on "));
    assert!(xml.contains(r#"<fork name="fork-0">"#));
    assert!(xml.contains("<exec>run.sh</exec>"));
}

#[test]
fn test_compile_output_dir_and_graphviz() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    let workflow = write(temp_dir.path(), "nightly.yaml", NIGHTLY);

    weft_cmd()
        .args(["compile", "-c", arg(&config), "-i", arg(&workflow), "-o", arg(&out), "-g"])
        .assert()
        .success();

    assert!(out.join("nightly.xml").exists());
    let dot = fs::read_to_string(out.join("dot/nightly.dot")).unwrap();
    assert!(dot.starts_with("digraph"));
    assert!(out.join("dot/nightly-input.dot").exists());
}

#[test]
fn test_compile_directory_input() {
    let temp_dir = TempDir::new().unwrap();
    let flows = temp_dir.path().join("flows");
    fs::create_dir(&flows).unwrap();
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    write(&flows, "a.yaml", "name: a\nactions:\n  - {name: s, type: shell}\n");
    write(&flows, "b.yml", "name: b\nactions:\n  - {name: s, type: shell}\n");
    write(&flows, "notes.txt", "not a workflow");

    weft_cmd()
        .args(["compile", "-c", arg(&config), "-i", arg(&flows)])
        .assert()
        .success();

    assert!(flows.join("a.xml").exists());
    assert!(flows.join("b.xml").exists());
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    let workflow = write(temp_dir.path(), "nightly.yaml", NIGHTLY);

    weft_cmd()
        .args(["validate", "-c", arg(&config), "-i", arg(&workflow)])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));

    assert!(!temp_dir.path().join("nightly.xml").exists());
}

#[test]
fn test_validate_json_format() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    let workflow = write(temp_dir.path(), "nightly.yaml", NIGHTLY);

    let output = weft_cmd()
        .args(["validate", "-c", arg(&config), "-i", arg(&workflow), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["workflows"][0]["workflow"], "nightly");
    assert_eq!(json["workflows"][0]["forks"], 1);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_failing_workflow_exits_nonzero_but_others_compile() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    let bad = write(
        temp_dir.path(),
        "bad.yaml",
        "name: bad\nactions:\n  - {name: a, type: shell, dependencies: [ghost]}\n",
    );
    let good = write(temp_dir.path(), "nightly.yaml", NIGHTLY);

    weft_cmd()
        .args(["compile", "-c", arg(&config), "-i", arg(&bad), "-i", arg(&good)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));

    assert!(temp_dir.path().join("nightly.xml").exists());
    assert!(!temp_dir.path().join("bad.xml").exists());
}

#[test]
fn test_config_conflict_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    let clash = write(
        temp_dir.path(),
        "clash.yaml",
        "actionTypes:\n  - {name: shell, tag: ssh}\n",
    );
    let workflow = write(temp_dir.path(), "nightly.yaml", NIGHTLY);

    weft_cmd()
        .args([
            "compile",
            "-c",
            arg(&config),
            "-c",
            arg(&clash),
            "-i",
            arg(&workflow),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WEFT-"));

    assert!(!temp_dir.path().join("nightly.xml").exists());
}

#[test]
fn test_same_stem_into_output_dir_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let config = write(temp_dir.path(), "config.yaml", CONFIG);
    let team_a = temp_dir.path().join("team-a");
    let team_b = temp_dir.path().join("team-b");
    fs::create_dir(&team_a).unwrap();
    fs::create_dir(&team_b).unwrap();
    let first = write(&team_a, "nightly.yaml", NIGHTLY);
    let second = write(&team_b, "nightly.yaml", NIGHTLY);

    weft_cmd()
        .args([
            "compile",
            "-c",
            arg(&config),
            "-i",
            arg(&first),
            "-i",
            arg(&second),
            "-o",
            arg(&out),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WEFT-042"));

    assert!(out.join("nightly.xml").exists());
}

#[test]
fn test_missing_input_path() {
    weft_cmd()
        .args(["validate", "-i", "/definitely/not/here.yaml"])
        .assert()
        .failure();
}
