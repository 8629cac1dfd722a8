//! CLI integration tests for modfleet.
//!
//! The `go` toolchain is pointed at a missing binary so every probe falls
//! back to reading `go.mod`, and no test touches the network.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const LIB: &str = "github.com/acme/lib";

/// The modfleet binary, isolated from the user's config and credentials.
fn modfleet(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("modfleet").unwrap();
    cmd.env("MODFLEET_GO", "/nonexistent/bin/go")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("GITHUB_API_URL", "http://127.0.0.1:1")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GH_TOKEN")
        .env_remove("GITHUB_PAT")
        .env_remove("GOPROXY");
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A workspace with the target, two dependents and one unrelated module.
fn workspace() -> TempDir {
    let tmp = temp_dir();
    let root = tmp.path();
    write(root, "lib/go.mod", &format!("module {}\n\ngo 1.21\n", LIB));
    write(
        root,
        "api/go.mod",
        &format!(
            "module github.com/acme/api\n\ngo 1.21\n\nrequire {} v1.2.0\n",
            LIB
        ),
    );
    write(
        root,
        "worker/go.mod",
        &format!(
            "module github.com/acme/worker\n\ngo 1.21\n\nrequire (\n\t{} v0.9.1\n\tgithub.com/pkg/errors v0.9.1\n)\n",
            LIB
        ),
    );
    write(
        root,
        "tools/go.mod",
        "module github.com/acme/tools\n\ngo 1.21\n\nrequire github.com/pkg/errors v0.9.1\n",
    );
    tmp
}

const MANIFEST: &str = r#"
version = 1

[defaults]
branch = "main"
tests = ["go test ./..."]
labels = ["deps"]

[[modules]]
name = "lib"
module = "github.com/acme/lib"
repo = "github.com/acme/lib"

[[modules.dependents]]
repo = "github.com/acme/api"
module = "github.com/acme/api"

[[modules.dependents]]
repo = "github.com/acme/mono"
module = "github.com/acme/mono/svc/billing"
module_path = "svc/billing"
tests = ["make test"]
"#;

const CYCLIC_MANIFEST: &str = r#"
version = 1

[[modules]]
name = "lib"
module = "github.com/acme/lib"
repo = "github.com/acme/lib"

[[modules.dependents]]
repo = "github.com/acme/api"
module = "github.com/acme/api"

[[modules]]
name = "api"
module = "github.com/acme/api"
repo = "github.com/acme/api"

[[modules.dependents]]
repo = "github.com/acme/lib"
module = "github.com/acme/lib"
"#;

// ============================================================================
// modfleet discover local
// ============================================================================

#[test]
fn test_discover_local_lists_dependents() {
    let ws = workspace();

    modfleet(ws.path())
        .args(["discover", "local", "--target", LIB])
        .current_dir(ws.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("github.com/acme/api  v1.2.0  api"))
        .stdout(predicate::str::contains("github.com/acme/worker  v0.9.1  worker"))
        .stdout(predicate::str::contains("github.com/acme/tools").not())
        .stdout(predicate::str::contains("github.com/acme/lib  ").not());
}

#[test]
fn test_discover_local_older_than() {
    let ws = workspace();

    modfleet(ws.path())
        .args(["discover", "local", "--target", LIB, "--older-than", "v1.0.0"])
        .current_dir(ws.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("github.com/acme/worker"))
        .stdout(predicate::str::contains("github.com/acme/api").not());
}

#[test]
fn test_discover_local_exclude() {
    let ws = workspace();

    modfleet(ws.path())
        .args(["discover", "local", "--target", LIB, "--exclude", "worker"])
        .arg(ws.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("github.com/acme/api"))
        .stdout(predicate::str::contains("github.com/acme/worker").not());
}

#[test]
fn test_discover_local_json() {
    let ws = workspace();

    let output = modfleet(ws.path())
        .args(["discover", "local", "--target", LIB, "--format", "json"])
        .current_dir(ws.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let found: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let modules: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["module"].as_str().unwrap())
        .collect();
    assert_eq!(modules.len(), 2);
    assert!(modules.contains(&"github.com/acme/api"));
    assert!(modules.contains(&"github.com/acme/worker"));
}

#[test]
fn test_discover_local_toml_is_manifest_ready() {
    let ws = workspace();

    modfleet(ws.path())
        .args(["discover", "local", "--target", LIB, "--format", "toml"])
        .current_dir(ws.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[[dependents]]"))
        .stdout(predicate::str::contains(r#"repo = "github.com/acme/api""#));
}

#[test]
fn test_discover_local_invalid_target_version() {
    let ws = workspace();

    modfleet(ws.path())
        .args(["discover", "local", "--target", LIB, "--older-than", "latest"])
        .current_dir(ws.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_discover_remote_unreachable_api_fails() {
    let home = temp_dir();

    modfleet(home.path())
        .args(["discover", "remote", "acme", "--target", LIB])
        .current_dir(home.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

// ============================================================================
// modfleet version
// ============================================================================

#[test]
fn test_version_local_strategy() {
    let ws = workspace();

    modfleet(ws.path())
        .args(["version", LIB, "--strategy", "local"])
        .current_dir(ws.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(local"));
}

#[test]
fn test_version_local_json() {
    let ws = workspace();

    let output = modfleet(ws.path())
        .args(["version", LIB, "-s", "local", "--format", "json"])
        .arg("--workspace")
        .arg(ws.path().join("api"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let resolution: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resolution["version"], "v1.2.0");
    assert_eq!(resolution["source"], "local");
}

#[test]
fn test_version_auto_without_network_is_exhausted() {
    let ws = workspace();

    modfleet(ws.path())
        .args(["version", "github.com/acme/unknown"])
        .current_dir(ws.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to resolve version"))
        .stderr(predicate::str::contains("network access is disabled"));
}

#[test]
fn test_version_rejects_unknown_strategy() {
    let home = temp_dir();

    modfleet(home.path())
        .args(["version", LIB, "--strategy", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown version strategy"));
}

// ============================================================================
// modfleet validate / expand
// ============================================================================

#[test]
fn test_validate_ok() {
    let tmp = temp_dir();
    write(tmp.path(), "modfleet.toml", MANIFEST);

    modfleet(tmp.path())
        .arg("validate")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ok:"))
        .stdout(predicate::str::contains("(1 modules)"));
}

#[test]
fn test_validate_reports_cycle() {
    let tmp = temp_dir();
    write(tmp.path(), "fleet.toml", CYCLIC_MANIFEST);

    modfleet(tmp.path())
        .args(["validate", "fleet.toml"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cycle"));
}

#[test]
fn test_validate_missing_manifest() {
    let tmp = temp_dir();

    modfleet(tmp.path())
        .arg("validate")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("modfleet.toml"));
}

#[test]
fn test_expand_applies_defaults() {
    let tmp = temp_dir();
    write(tmp.path(), "modfleet.toml", MANIFEST);

    let output = modfleet(tmp.path())
        .args(["expand", "--format", "json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let dependents = manifest["modules"][0]["dependents"].as_array().unwrap();

    assert_eq!(dependents[0]["branch"], "main");
    assert_eq!(dependents[0]["tests"][0], "go test ./...");
    assert_eq!(dependents[1]["tests"][0], "go test ./...");
    assert_eq!(dependents[1]["tests"][1], "make test");
    assert_eq!(dependents[1]["labels"][0], "deps");
}

// ============================================================================
// misc
// ============================================================================

#[test]
fn test_completions_bash() {
    let home = temp_dir();

    modfleet(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("modfleet"));
}

#[test]
fn test_help_lists_commands() {
    let home = temp_dir();

    modfleet(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("discover"))
        .stdout(predicate::str::contains("version"))
        .stdout(predicate::str::contains("validate"));
}
