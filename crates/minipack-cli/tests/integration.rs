//! End-to-end tests running the minipack binary against a fixture bundle.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn minipack() -> Command {
    Command::cargo_bin("minipack").expect("Failed to find minipack binary")
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A bundle with one shared component used only by a subpackage.
fn build_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("dist");

    write(
        &root.join("app.json"),
        r#"{"pages": ["pages/index/index"], "subPackages": [{"root": "sub1"}]}"#,
    );
    write(&root.join("pages/index/index.json"), "{}");
    write(&root.join("components/y/index.json"), r#"{"component": true}"#);
    write(&root.join("components/y/index.js"), "Component({});");
    write(
        &root.join("sub1/pages/detail/index.json"),
        r#"{"usingComponents": {"y": "../../../components/y/index"}}"#,
    );

    temp
}

// Point HOME at the temp dir so a developer's global config cannot leak
// into the run.
fn run_in(temp: &TempDir, args: &[&str]) -> assert_cmd::assert::Assert {
    minipack()
        .env("HOME", temp.path())
        .args(args)
        .assert()
}

#[test]
fn test_optimize_relocates_component() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    run_in(&temp, &["--quiet", "optimize", root_str]).success();

    assert!(root.join("sub1/sharedComponents/y/index.js").exists());
    assert!(!root.join("components/y").exists());
    let page = std::fs::read_to_string(root.join("sub1/pages/detail/index.json")).unwrap();
    assert!(page.contains(r#""../../sharedComponents/y/index""#));
}

#[test]
fn test_optimize_prints_summary_and_log_path() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    run_in(&temp, &["optimize", root_str])
        .success()
        .stdout(predicate::str::contains("Optimization pass complete"))
        .stdout(predicate::str::contains("run log:"));
}

#[test]
fn test_optimize_dry_run_leaves_tree_untouched() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    run_in(&temp, &["optimize", root_str, "--dry-run"])
        .success()
        .stdout(predicate::str::contains("dry run"));

    assert!(root.join("components/y/index.js").exists());
    assert!(!root.join("sub1/sharedComponents").exists());
}

#[test]
fn test_optimize_custom_copy_dir() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    run_in(&temp, &["--quiet", "optimize", root_str, "--copy-dir", "localShared"]).success();

    assert!(root.join("sub1/localShared/y/index.js").exists());
    let page = std::fs::read_to_string(root.join("sub1/pages/detail/index.json")).unwrap();
    assert!(page.contains(r#""../../localShared/y/index""#));
}

#[test]
fn test_analyze_json_output() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    let assert = run_in(&temp, &["analyze", root_str, "--json"]).success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(value["prunable"], serde_json::json!(["y"]));
    assert_eq!(value["retained"], serde_json::json!([]));
    assert_eq!(value["subpackages"][0]["name"], "sub1");
    assert_eq!(value["subpackages"][0]["duplications"], serde_json::json!(["y"]));

    // Analysis never mutates the tree.
    assert!(root.join("components/y/index.js").exists());
}

#[test]
fn test_optimize_missing_bundle_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("no-such-dist");

    run_in(&temp, &["optimize", missing.to_str().unwrap()])
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_local_config_file_is_honored() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    // minipack.toml lives next to the bundle, in the output root's parent.
    write(
        &temp.path().join("minipack.toml"),
        "[optimizer]\nlocal_copy_dir = \"fromConfig\"\n",
    );

    run_in(&temp, &["--quiet", "optimize", root_str]).success();
    assert!(root.join("sub1/fromConfig/y/index.js").exists());
}

#[test]
fn test_config_verbose_enables_debug_output() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    write(&temp.path().join("minipack.toml"), "[optimizer]\nverbose = true\n");

    // Rewrite detail is logged at debug level only.
    run_in(&temp, &["optimize", root_str])
        .success()
        .stderr(predicate::str::contains("rewrote path literals"));
}

#[test]
fn test_disabled_via_config_is_noop() {
    let temp = build_fixture();
    let root = temp.path().join("dist");
    let root_str = root.to_str().unwrap();

    write(&temp.path().join("minipack.toml"), "[optimizer]\nenabled = false\n");

    run_in(&temp, &["optimize", root_str])
        .success()
        .stdout(predicate::str::contains("disabled"));
    assert!(root.join("components/y/index.js").exists());
}
