//! End-to-end tests: spawn the built `angler` binary against fixture
//! handler scripts implementing the wire protocol over shell.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

fn angler_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_angler"))
}

fn write_executable(path: &Path, script: &str) {
    fs::write(path, script).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// A `path` handler that tracks folder existence in a sibling state file so
/// `get`/`set` round-trip across invocations within one test.
fn write_path_handler(dir: &Path, state_file: &Path) -> PathBuf {
    let handler = dir.join("path-handler");
    write_executable(
        &handler,
        &format!(
            r#"#!/bin/sh
STATE="{state}"
case "$1" in
  list) echo path ;;
  get)
    if [ -f "$STATE" ]; then echo '{{"folder": {{}}}}'; else echo 'null'; fi
    ;;
  set)
    cat >/dev/null
    touch "$STATE"
    ;;
  node) ;;
esac
"#,
            state = state_file.display()
        ),
    );
    handler
}

#[test]
fn setup_creates_a_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let status = Command::new(angler_bin())
        .args(["-m", manifest.to_str().unwrap(), "setup"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(manifest.exists());
}

#[test]
fn add_then_apply_drives_state_via_handler() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let modules = dir.path().join("modules");
    fs::create_dir_all(&modules).unwrap();
    let state_file = dir.path().join("folder-exists");
    write_path_handler(&modules, &state_file);

    let manifest_str = manifest.to_str().unwrap();

    assert!(Command::new(angler_bin())
        .args(["-m", manifest_str, "setup"])
        .status()
        .unwrap()
        .success());

    assert!(Command::new(angler_bin())
        .args(["-m", manifest_str, "add", "path:///tmp/demo", "folder"])
        .status()
        .unwrap()
        .success());

    assert!(!state_file.exists());

    let output = Command::new(angler_bin())
        .args(["-m", manifest_str, "apply", "-H", modules.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    assert!(state_file.exists());
}

#[test]
fn apply_dryrun_does_not_invoke_set() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let modules = dir.path().join("modules");
    fs::create_dir_all(&modules).unwrap();
    let state_file = dir.path().join("folder-exists");
    write_path_handler(&modules, &state_file);

    let manifest_str = manifest.to_str().unwrap();
    Command::new(angler_bin())
        .args(["-m", manifest_str, "setup"])
        .status()
        .unwrap();
    Command::new(angler_bin())
        .args(["-m", manifest_str, "add", "path:///tmp/demo", "folder"])
        .status()
        .unwrap();

    let status = Command::new(angler_bin())
        .args(["-m", manifest_str, "apply", "-H", modules.to_str().unwrap(), "--dryrun"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(!state_file.exists());
}

#[test]
fn order_inserts_a_chain_of_edges() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let manifest_str = manifest.to_str().unwrap();

    Command::new(angler_bin())
        .args(["-m", manifest_str, "setup"])
        .status()
        .unwrap();
    for uri in ["a://h/1", "a://h/2", "a://h/3"] {
        Command::new(angler_bin())
            .args(["-m", manifest_str, "add", uri])
            .status()
            .unwrap();
    }
    let status = Command::new(angler_bin())
        .args(["-m", manifest_str, "order", "a://h/1", "a://h/2", "a://h/3"])
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn apply_with_a_cycle_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let manifest_str = manifest.to_str().unwrap();

    Command::new(angler_bin())
        .args(["-m", manifest_str, "setup"])
        .status()
        .unwrap();
    for uri in ["a://h/1", "a://h/2"] {
        Command::new(angler_bin())
            .args(["-m", manifest_str, "add", uri])
            .status()
            .unwrap();
    }
    Command::new(angler_bin())
        .args(["-m", manifest_str, "order", "a://h/1", "a://h/2"])
        .status()
        .unwrap();
    Command::new(angler_bin())
        .args(["-m", manifest_str, "order", "a://h/2", "a://h/1"])
        .status()
        .unwrap();

    let status = Command::new(angler_bin())
        .args(["-m", manifest_str, "apply"])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn elaboration_declares_both_node_and_edge_from_one_hook_response() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let modules = dir.path().join("modules");
    fs::create_dir_all(&modules).unwrap();
    let state_dir = dir.path().join("state");
    fs::create_dir_all(&state_dir).unwrap();

    // The `node` hook for a child path declares its parent folder node *and*
    // the parent-to-child edge in the same response, mirroring the upstream
    // path handler.
    write_executable(
        &modules.join("path-handler"),
        &format!(
            r#"#!/bin/sh
STATE="{state}"
case "$1" in
  list) echo path ;;
  get)
    if [ -f "$STATE$4" ]; then echo '{{"folder": {{}}}}'; else echo 'null'; fi
    ;;
  set)
    cat >/dev/null
    mkdir -p "$(dirname "$STATE$4")"
    touch "$STATE$4"
    ;;
  node)
    parent=$(dirname "$4")
    if [ "$parent" != "/" ] && [ "$parent" != "$4" ]; then
      echo "node path://$3$parent {{\"folder\": {{}}}}"
      echo "edge path://$3$parent path://$3$4"
    fi
    ;;
esac
"#,
            state = state_dir.display()
        ),
    );

    let manifest_str = manifest.to_str().unwrap();
    assert!(Command::new(angler_bin())
        .args(["-m", manifest_str, "setup"])
        .status()
        .unwrap()
        .success());
    assert!(Command::new(angler_bin())
        .args(["-m", manifest_str, "add", "path:///tmp/x/y", "folder"])
        .status()
        .unwrap()
        .success());

    let output = Command::new(angler_bin())
        .args(["-m", manifest_str, "apply", "-H", modules.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    assert!(state_dir.join("tmp/x/y").exists());
    assert!(state_dir.join("tmp/x").exists());
}

#[test]
fn per_node_failure_is_isolated_within_a_stage() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let modules = dir.path().join("modules");
    fs::create_dir_all(&modules).unwrap();

    // `set` fails only for the middle node; the others must still apply and
    // the run/skipped/errors counters must partition all three nodes.
    write_executable(
        &modules.join("path-handler"),
        r#"#!/bin/sh
case "$1" in
  list) echo path ;;
  get) echo 'null' ;;
  set)
    cat >/dev/null
    case "$4" in
      */b) exit 1 ;;
      *) exit 0 ;;
    esac
    ;;
  node) ;;
esac
"#,
    );

    let manifest_str = manifest.to_str().unwrap();
    assert!(Command::new(angler_bin())
        .args(["-m", manifest_str, "setup"])
        .status()
        .unwrap()
        .success());
    for uri in ["path:///tmp/a", "path:///tmp/b", "path:///tmp/c"] {
        assert!(Command::new(angler_bin())
            .args(["-m", manifest_str, "add", uri, "folder"])
            .status()
            .unwrap()
            .success());
    }

    let output = Command::new(angler_bin())
        .args(["-m", manifest_str, "-v", "apply", "-H", modules.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run=2"), "{stdout}");
    assert!(stdout.contains("skipped=0"), "{stdout}");
    assert!(stdout.contains("errors=1"), "{stdout}");
}

#[test]
fn add_rejects_malformed_property() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("angler.manifest");
    let manifest_str = manifest.to_str().unwrap();
    Command::new(angler_bin())
        .args(["-m", manifest_str, "setup"])
        .status()
        .unwrap();

    let status = Command::new(angler_bin())
        .args(["-m", manifest_str, "add", "a://h/1", "running", "not-key-value"])
        .status()
        .unwrap();
    assert!(!status.success());
}
