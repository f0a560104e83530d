//! Integration tests for the podwire CLI
//!
//! Tests end-to-end command behavior using the CLI binary.
//! Uses tempfile for isolated test directories.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Run podwire with the given args in the specified directory
fn run_podwire(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_podwire"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute podwire command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Write `App.xcodeproj` with an `App` native target and an empty products group
fn create_project(dir: &Path) {
    let project = dir.join("App.xcodeproj");
    fs::create_dir_all(&project).expect("Failed to create project dir");
    let document = json!({
        "archiveVersion": "1",
        "objectVersion": "46",
        "objects": {
            "ROOT": {
                "isa": "PBXProject",
                "productRefGroup": "PRODUCTS",
                "targets": ["APP"]
            },
            "PRODUCTS": { "isa": "PBXGroup", "children": [], "name": "Products" },
            "APP": {
                "isa": "PBXNativeTarget",
                "buildPhases": ["SOURCES"],
                "name": "App"
            },
            "SOURCES": { "isa": "PBXSourcesBuildPhase", "files": [] }
        },
        "rootObject": "ROOT"
    });
    fs::write(
        project.join("project.pbxproj"),
        serde_json::to_string_pretty(&document).unwrap(),
    )
    .expect("Failed to write project");
}

fn create_manifest(dir: &Path, name: &str, project: &str, links_as_framework: bool) {
    let content = format!(
        r#"
[[targets]]
name = "{name}"
product_basename = "{name}"
links_as_framework = {links_as_framework}
copy_resources_script = "Target Support Files/{name}/{name}-resources.sh"
project = "{project}"
consumers = ["App"]
"#
    );
    fs::write(dir.join("podwire.toml"), content).expect("Failed to write manifest");
}

fn setup(links_as_framework: bool) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    create_project(temp_dir.path());
    create_manifest(
        temp_dir.path(),
        "Pods-App",
        "App.xcodeproj",
        links_as_framework,
    );
    temp_dir
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_str(&stdout(output))
        .unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout(output)))
}

// ============================================================================
// Integrate Command Tests
// ============================================================================

#[test]
fn test_integrate_table_output() {
    let temp_dir = setup(true);
    let output = run_podwire(temp_dir.path(), &["integrate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout_str = stdout(&output);
    assert!(
        stdout_str.contains("Integrating target `Pods-App` (`App.xcodeproj` project)"),
        "got: {}",
        stdout_str
    );
    assert!(stdout_str.contains("Pods-App saved (integrated App)"));
}

#[test]
fn test_integrate_json_then_rerun_is_unchanged() {
    let temp_dir = setup(true);

    let first = run_podwire(temp_dir.path(), &["integrate", "--format", "json"]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    let json = parse_json(&first);
    let report = &json[0]["report"];
    assert_eq!(report["dirty"], json!(true));
    assert_eq!(report["persistence"], json!("saved"));
    assert_eq!(report["integrated_nodes"], json!(["App"]));
    assert_eq!(json[0]["messages"][0]["kind"], json!("section"));

    let second = run_podwire(temp_dir.path(), &["integrate", "--format", "json"]);
    assert!(second.status.success());
    let json = parse_json(&second);
    assert_eq!(json[0]["report"]["dirty"], json!(false));
    assert_eq!(json[0]["report"]["persistence"], json!("touched"));
}

#[test]
fn test_integrate_reports_stale_reference() {
    let temp_dir = setup(false);
    let first = run_podwire(temp_dir.path(), &["integrate"]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));

    create_manifest(temp_dir.path(), "Pods-App", "App.xcodeproj", true);
    let second = run_podwire(temp_dir.path(), &["integrate"]);
    assert!(second.status.success());
    assert!(stdout(&second)
        .contains("Removing stale product reference `libPods-App.a` from project"));
}

#[test]
fn test_integrate_missing_project_fails() {
    let temp_dir = TempDir::new().unwrap();
    create_manifest(temp_dir.path(), "Pods-App", "Missing.xcodeproj", true);

    let output = run_podwire(temp_dir.path(), &["integrate"]);
    assert!(!output.status.success());
    let stderr_str = stderr(&output);
    assert!(stderr_str.contains("Pods-App"), "got: {}", stderr_str);
    assert!(stderr_str.contains("Missing.xcodeproj"));
}

#[test]
fn test_integrate_keep_going_runs_remaining_targets() {
    let temp_dir = TempDir::new().unwrap();
    create_project(temp_dir.path());
    fs::write(
        temp_dir.path().join("podwire.toml"),
        r#"
[[targets]]
name = "Pods-Broken"
product_basename = "Pods_Broken"
copy_resources_script = "broken.sh"
project = "Missing.xcodeproj"
consumers = ["App"]

[[targets]]
name = "Pods-App"
product_basename = "Pods_App"
copy_resources_script = "app.sh"
project = "App.xcodeproj"
consumers = ["App"]
"#,
    )
    .unwrap();

    let output = run_podwire(
        temp_dir.path(),
        &["integrate", "--keep-going", "--format", "json"],
    );
    assert!(!output.status.success());
    let json = parse_json(&output);
    assert!(json[0]["error"].is_string());
    assert_eq!(json[1]["report"]["dirty"], json!(true));
    assert!(stderr(&output).contains("1 of 2 targets failed"));
}

#[test]
fn test_integrate_missing_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_podwire(temp_dir.path(), &["integrate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Manifest not found"));
}

// ============================================================================
// Status Command Tests
// ============================================================================

#[test]
fn test_status_is_read_only() {
    let temp_dir = setup(true);
    let descriptor = temp_dir.path().join("App.xcodeproj/project.pbxproj");
    let before = fs::read(&descriptor).unwrap();

    let output = run_podwire(temp_dir.path(), &["status", "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json = parse_json(&output);
    assert_eq!(json[0]["product"], json!("Pods-App.framework"));
    assert_eq!(json[0]["nodes_to_integrate"], json!(["App"]));
    assert_eq!(fs::read(&descriptor).unwrap(), before);

    run_podwire(temp_dir.path(), &["integrate"]);
    let output = run_podwire(temp_dir.path(), &["status"]);
    assert!(stdout(&output).contains("Up to date"));
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_inspect_after_integration() {
    let temp_dir = setup(false);
    run_podwire(temp_dir.path(), &["integrate"]);

    let output = run_podwire(
        temp_dir.path(),
        &["inspect", "App.xcodeproj", "--format", "json"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json = parse_json(&output);

    let phases: Vec<&str> = json["nodes"][0]["phases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        phases,
        vec![
            "Check Pods Manifest.lock",
            "PBXSourcesBuildPhase",
            "Frameworks",
            "Copy Pods Resources"
        ]
    );
    assert_eq!(json["nodes"][0]["phases"][2]["links"], json!(["libPods-App.a"]));
    assert_eq!(json["products"][0]["file_type"], json!("archive.ar"));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_sets_manifest_and_format() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("ios");
    fs::create_dir_all(&nested).unwrap();
    create_project(&nested);
    create_manifest(&nested, "Pods-App", "App.xcodeproj", true);
    fs::write(
        temp_dir.path().join(".podwirerc.toml"),
        "[manifest]\npath = \"ios/podwire.toml\"\n\n[output]\nformat = \"json\"\n",
    )
    .unwrap();

    let output = run_podwire(temp_dir.path(), &["integrate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json = parse_json(&output);
    assert_eq!(json[0]["target"], json!("Pods-App"));
    assert!(nested.join("App.xcodeproj/project.pbxproj").exists());
}

#[test]
fn test_strict_rejects_malformed_config() {
    let temp_dir = setup(true);
    fs::write(temp_dir.path().join(".podwirerc.toml"), "[output\n").unwrap();

    let lenient = run_podwire(temp_dir.path(), &["status"]);
    assert!(lenient.status.success(), "stderr: {}", stderr(&lenient));

    let strict = run_podwire(temp_dir.path(), &["status", "--strict"]);
    assert!(!strict.status.success());
    assert!(stderr(&strict).contains(".podwirerc.toml"));
}
