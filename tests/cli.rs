use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

// item#1 runs inside item#0; item#3 and item#4 only depend on each other
const PLAN: &str = r#"{
  "items": [
    {"id": 0, "lane": 0, "startDate": "2024-01-01", "durationDays": 5},
    {"id": 1, "lane": 1, "startDate": "2024-01-04", "durationDays": 2},
    {"id": 3, "lane": 2, "startDate": "2024-01-10", "durationDays": 1},
    {"id": 4, "lane": 3, "startDate": "2024-01-12", "durationDays": 1}
  ],
  "links": [
    {"id": 2, "originId": 0, "endId": 1},
    {"id": 5, "originId": 3, "endId": 4},
    {"id": 6, "originId": 4, "endId": 3}
  ],
  "grid": {"laneCount": 4, "dayCount": 31, "dayUnit": "DAY", "originDate": "2024-01-01"},
  "idCounter": 7
}"#;

fn write_plan(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("plan.json");
    std::fs::write(&path, json).unwrap();
    path
}

fn ganttline(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ganttline").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn test_check_prints_statuses() {
    let dir = TempDir::new().unwrap();
    let plan = write_plan(&dir, PLAN);

    ganttline(&dir)
        .arg("check")
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains("item#0\tlane 0\t2024-01-01 .. 2024-01-05\tCLEAR"))
        .stdout(predicate::str::contains("item#1\tlane 1\t2024-01-04 .. 2024-01-05\tBLOCKED"))
        .stdout(predicate::str::contains("item#3\tlane 2\t2024-01-10 .. 2024-01-10\tno information"));
}

#[test]
fn test_fail_on_blocked_exit_code() {
    let dir = TempDir::new().unwrap();
    let plan = write_plan(&dir, PLAN);

    ganttline(&dir)
        .args(["check", "--fail-on-blocked"])
        .arg(&plan)
        .assert()
        .code(2);
}

#[test]
fn test_export_json() {
    let dir = TempDir::new().unwrap();
    let plan = write_plan(&dir, PLAN);

    let output = ganttline(&dir)
        .arg("export")
        .arg(&plan)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["items"].as_array().unwrap().len(), 4);
    assert_eq!(value["items"][1]["status"], "BLOCKED");
    assert!(value["items"][2]["status"].is_null());
    assert!(value["links"][0]["descriptor"]
        .as_str()
        .unwrap()
        .starts_with('M'));
}

#[test]
fn test_local_config_is_picked_up() {
    let dir = TempDir::new().unwrap();
    let plan = write_plan(&dir, PLAN);
    std::fs::write(
        dir.path().join("ganttline.yml"),
        "grid:\n  lane_height: 10.0\n  unit_width: 20.0\n",
    )
    .unwrap();

    let output = ganttline(&dir)
        .arg("export")
        .arg(&plan)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["items"][1]["rect"]["y"], 10.0);
    assert_eq!(value["items"][1]["rect"]["x"], 60.0);
}

#[test]
fn test_missing_plan_fails() {
    let dir = TempDir::new().unwrap();

    ganttline(&dir)
        .args(["check", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading plan"));
}

#[test]
fn test_corrupt_plan_rejected() {
    let dir = TempDir::new().unwrap();
    // idCounter must exceed every stored id
    let plan = write_plan(&dir, &PLAN.replace("\"idCounter\": 7", "\"idCounter\": 2"));

    ganttline(&dir)
        .arg("check")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("idCounter"));
}

#[test]
fn test_oversized_duration_rejected() {
    let dir = TempDir::new().unwrap();
    let plan = write_plan(
        &dir,
        &PLAN.replace("\"durationDays\": 5", "\"durationDays\": 4000000000"),
    );

    ganttline(&dir)
        .arg("export")
        .arg(&plan)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("last supported date"));
}
