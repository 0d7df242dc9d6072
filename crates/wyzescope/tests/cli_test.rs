#![allow(clippy::unwrap_used)]
// End-to-end CLI tests. The diff path needs no network, so it is
// exercised against snapshot fixtures on disk.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_snapshot(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn snapshot_with_p1(value: &str, extra_pid: bool) -> String {
    let p2 = if extra_pid { r#","P2":"on""# } else { "" };
    format!(
        r#"{{
  "captured_at": "2026-08-01T00:00:00Z",
  "fetch_options": {{"include_device_info": true, "include_events": false, "max_concurrent": 2}},
  "devices": [
    {{"mac": "AA:BB", "nickname": "Porch", "product_model": "CAM1",
      "firmware_version": "4.36.1", "raw": {{}}, "device_params": {{}},
      "property_list": {{"P1": "{value}"{p2}}}}},
    {{"mac": "CC:DD", "nickname": "Garage", "product_model": "CAM2",
      "firmware_version": "4.25.9", "raw": {{}}, "device_params": {{}},
      "property_list": {{}}}}
  ]
}}"#
    )
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("wyzescope")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scrape"))
        .stdout(predicate::str::contains("diff"));
}

#[test]
fn diff_reports_property_changes() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", &snapshot_with_p1("0", false));
    let after = write_snapshot(dir.path(), "after.json", &snapshot_with_p1("1", true));

    Command::cargo_bin("wyzescope")
        .unwrap()
        .arg("diff")
        .arg(&before)
        .arg(&after)
        .assert()
        .success()
        .stdout(predicate::str::contains("AA:BB  Porch  CAM1"))
        .stdout(predicate::str::contains("== PROPERTY_LIST PID CHANGES =="))
        .stdout(predicate::str::contains("~ P1: \"0\" -> \"1\""))
        .stdout(predicate::str::contains("+ P2: -> \"on\""));
}

#[test]
fn diff_of_identical_snapshots_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", &snapshot_with_p1("0", false));
    let after = write_snapshot(dir.path(), "after.json", &snapshot_with_p1("0", false));

    Command::cargo_bin("wyzescope")
        .unwrap()
        .arg("diff")
        .arg(&before)
        .arg(&after)
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences found."));
}

#[test]
fn diff_mac_filter_on_unchanged_device_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", &snapshot_with_p1("0", false));
    let after = write_snapshot(dir.path(), "after.json", &snapshot_with_p1("1", false));

    // CC:DD did not change; AA:BB did. Filtering to CC:DD must succeed
    // with an empty report.
    Command::cargo_bin("wyzescope")
        .unwrap()
        .arg("diff")
        .arg(&before)
        .arg(&after)
        .args(["--mac", "cc:dd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences found."));
}

#[test]
fn diff_unknown_mac_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", &snapshot_with_p1("0", false));
    let after = write_snapshot(dir.path(), "after.json", &snapshot_with_p1("1", false));

    Command::cargo_bin("wyzescope")
        .unwrap()
        .arg("diff")
        .arg(&before)
        .arg(&after)
        .args(["--mac", "99:99"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("99:99"));
}

#[test]
fn diff_rejects_malformed_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", "{\"devices\": 42}");
    let after = write_snapshot(dir.path(), "after.json", &snapshot_with_p1("0", false));

    Command::cargo_bin("wyzescope")
        .unwrap()
        .arg("diff")
        .arg(&before)
        .arg(&after)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not a valid snapshot"));
}

#[test]
fn diff_json_output_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let before = write_snapshot(dir.path(), "before.json", &snapshot_with_p1("0", false));
    let after = write_snapshot(dir.path(), "after.json", &snapshot_with_p1("1", false));

    let output = Command::cargo_bin("wyzescope")
        .unwrap()
        .args(["-o", "json", "diff"])
        .arg(&before)
        .arg(&after)
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = parsed["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["key"], "P1");
    assert_eq!(entries[0]["kind"], "changed");
    assert_eq!(entries[0]["namespace"], "property_list");
}

#[test]
fn scrape_without_credentials_exits_auth() {
    Command::cargo_bin("wyzescope")
        .unwrap()
        .env_remove("WYZE_EMAIL")
        .env_remove("WYZE_PASSWORD")
        .env_remove("WYZE_KEY_ID")
        .env_remove("WYZE_API_KEY")
        .arg("scrape")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Missing credentials"));
}
