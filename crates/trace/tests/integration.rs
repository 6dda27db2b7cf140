//! End-to-end CLI integration tests for the `trace` binary.
//!
//! Each test creates its own temporary directory, initializes a layout, and
//! exercises the `trace` binary as a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `trace` binary, isolated from
/// any `TRACE_*` variables in the caller's environment.
fn trace() -> Command {
    let mut cmd = Command::cargo_bin("trace").unwrap();
    for var in ["TRACE_DIR", "TRACE_LAYOUT", "TRACE_EDIT_DELAY_MS", "TRACE_ON_DELETE"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Initialize a fresh layout in a temp directory and return the handle.
fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    trace()
        .args(["init", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();
    tmp
}

/// Add one series and return its key (parsed from `--json` output).
fn add(tmp: &TempDir, text: &str, extra_args: &[&str]) -> String {
    let mut args = vec!["add", text, "--json"];
    args.extend_from_slice(extra_args);
    let output = trace().args(&args).current_dir(tmp.path()).output().unwrap();
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json[0]["key"].as_str().unwrap().to_string()
}

fn layout(tmp: &TempDir) -> serde_json::Value {
    let output = trace()
        .args(["list", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_trace_dir() {
    let tmp = init_project();
    assert!(tmp.path().join(".trace/layout.json").exists());
    assert!(tmp.path().join(".trace/config.yaml").exists());

    trace()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));

    trace()
        .args(["init", "--force"])
        .current_dir(tmp.path())
        .assert()
        .success();
}

#[test]
fn commands_require_init() {
    let tmp = TempDir::new().unwrap();
    trace()
        .args(["add", "SR:T"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("trace init"));
}

// ---------------------------------------------------------------------------
// Curves and formulas
// ---------------------------------------------------------------------------

#[test]
fn keys_are_sequential_and_axis_is_created() {
    let tmp = init_project();
    assert_eq!(add(&tmp, "SR:C01:TEMP", &[]), "PV1");
    assert_eq!(add(&tmp, "f://{PV1}*2", &[]), "PV2");

    let layout = layout(&tmp);
    let axes = layout["axes"].as_array().unwrap();
    assert_eq!(axes.len(), 1);
    assert_eq!(axes[0]["name"], "Y-Axis 1");
    let curves = axes[0]["curves"].as_array().unwrap();
    assert_eq!(curves[0]["key"], "PV1");
    assert_eq!(curves[1]["text"], "f://{PV1}*2");
    assert_eq!(layout["next_key"], 3);
}

#[test]
fn unknown_variable_is_rejected_and_burns_a_key() {
    let tmp = init_project();
    add(&tmp, "SR:T", &[]);

    trace()
        .args(["add", "f://{PV9}+1"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid variable name"));

    // The rejected formula consumed PV2.
    assert_eq!(add(&tmp, "SR:U", &[]), "PV3");
}

#[test]
fn formula_edit_replaces_key_and_reports_dangling() {
    let tmp = init_project();
    add(&tmp, "SR:T", &[]);
    add(&tmp, "f://{PV1}*2", &[]);
    add(&tmp, "f://{PV2}+1", &[]);

    trace()
        .args(["edit", "PV2", "f://{PV1}*3"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Replaced PV2 with PV4"))
        .stderr(predicate::str::contains("PV3 still references PV2"));

    let layout = layout(&tmp);
    let curves = layout["axes"][0]["curves"].as_array().unwrap();
    // The replacement keeps the old curve's slot.
    assert_eq!(curves[1]["key"], "PV4");
    assert_eq!(curves[1]["text"], "f://{PV1}*3");
}

#[test]
fn cyclic_and_self_referencing_edits_fail() {
    let tmp = init_project();
    add(&tmp, "SR:T", &[]);
    add(&tmp, "f://{PV1}*2", &[]);
    add(&tmp, "f://{PV2}+1", &[]);

    trace()
        .args(["edit", "PV2", "f://{PV3}"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("recursive dependency"));

    trace()
        .args(["edit", "PV2", "f://{PV2}+1"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is recursive"));

    let layout = layout(&tmp);
    assert_eq!(layout["axes"][0]["curves"][1]["text"], "f://{PV1}*2");
}

#[test]
fn direct_curve_can_become_a_formula_but_not_a_cycle() {
    let tmp = init_project();
    add(&tmp, "SR:A", &[]);
    add(&tmp, "f://{PV1}+1", &[]);

    trace()
        .args(["edit", "PV1", "f://{PV2}+1"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("recursive dependency"));
    assert_eq!(layout(&tmp)["axes"][0]["curves"][0]["text"], "SR:A");

    add(&tmp, "SR:B", &[]);
    trace()
        .args(["edit", "PV1", "f://{PV3}*2"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Replaced PV1 with PV4"))
        .stderr(predicate::str::contains("PV2 still references PV1"));

    // The dangling PV2 does not stop the layout from loading.
    let layout = layout(&tmp);
    assert_eq!(layout["axes"][0]["curves"][0]["key"], "PV4");
    assert_eq!(layout["axes"][0]["curves"][1]["text"], "f://{PV1}+1");
}

#[test]
fn rejected_batch_still_persists_burned_keys() {
    let tmp = init_project();
    trace()
        .args(["add", "f://{PV7}", "f://{PV8}"])
        .current_dir(tmp.path())
        .assert()
        .failure();
    assert_eq!(add(&tmp, "SR:A", &[]), "PV3");
}

#[test]
fn address_edit_keeps_key() {
    let tmp = init_project();
    add(&tmp, "SR:T", &[]);
    trace()
        .args(["edit", "PV1", "SR:U"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated PV1"));
    assert_eq!(layout(&tmp)["axes"][0]["curves"][0]["text"], "SR:U");
}

#[test]
fn eval_follows_formulas() {
    let tmp = init_project();
    add(&tmp, "SR:T", &[]);
    add(&tmp, "f://{PV1}*2+1", &[]);

    let output = trace()
        .args(["eval", "PV2", "--set", "PV1=3", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["value"], 7.0);
}

#[test]
fn rm_reports_dangling_dependents() {
    let tmp = init_project();
    add(&tmp, "SR:T", &[]);
    add(&tmp, "f://{PV1}*2", &[]);

    let output = trace()
        .args(["rm", "PV1", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["removed"], serde_json::json!(["PV1"]));
    assert_eq!(json["dangling"], serde_json::json!(["PV2"]));

    trace()
        .arg("list")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("PV2 references deleted curve PV1"));
}

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

#[test]
fn axis_lifecycle() {
    let tmp = init_project();
    trace()
        .args(["axis", "add", "Temp"])
        .current_dir(tmp.path())
        .assert()
        .success();
    trace()
        .args(["axis", "add"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Y-Axis 1"));

    add(&tmp, "SR:T", &["--axis", "Temp"]);
    trace()
        .args(["mv", "PV1", "Y-Axis 1"])
        .current_dir(tmp.path())
        .assert()
        .success();

    trace()
        .args(["axis", "rename", "Y-Axis 1", "Temp"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));

    trace()
        .args(["axis", "range", "Temp", "--min", "-5", "--max", "5"])
        .current_dir(tmp.path())
        .assert()
        .success();
    trace()
        .args(["axis", "hide", "Y-Axis 1"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let layout = layout(&tmp);
    assert_eq!(layout["axes"][0]["auto_range"], false);
    assert_eq!(layout["axes"][0]["min"], -5.0);
    assert_eq!(layout["axes"][1]["visible"], false);
    assert_eq!(layout["axes"][1]["curves"][0]["active"], false);

    trace()
        .args(["axis", "rm", "Y-Axis 1"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted PV1"));
    assert_eq!(layout_axes(&tmp), 1);
}

fn layout_axes(tmp: &TempDir) -> usize {
    layout(tmp)["axes"].as_array().unwrap().len()
}

#[test]
fn set_flags() {
    let tmp = init_project();
    add(&tmp, "SR:T", &[]);
    trace()
        .args(["set", "PV1", "--live", "true", "--archive", "false"])
        .current_dir(tmp.path())
        .assert()
        .success();
    let layout = layout(&tmp);
    assert_eq!(layout["axes"][0]["curves"][0]["live"], true);
    assert_eq!(layout["axes"][0]["curves"][0]["archive"], false);

    trace()
        .args(["set", "PV1"])
        .current_dir(tmp.path())
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

#[test]
fn version_and_completion() {
    trace()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("trace version"));
    trace()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trace"));
}

#[test]
fn json_errors() {
    let tmp = init_project();
    let output = trace()
        .args(["rm", "PV7", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"error\""), "stderr: {}", stderr);
}
