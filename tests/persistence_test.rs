#![cfg(feature = "storage-rocksdb")]

mod common;

use common::{COMPLETE_FORM, DRAFT_FORM, admissions};
use tempfile::tempdir;

#[test]
fn test_rocksdb_draft_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: save a draft
    let output1 = admissions()
        .args(["--owner", "user-1", "--db-path"])
        .arg(&db_path)
        .args(["draft", "--file", DRAFT_FORM])
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let draft_id = String::from_utf8_lossy(&output1.stdout).trim().to_string();

    // 2. Second run: promote the same draft using the same DB path
    let output2 = admissions()
        .args(["--owner", "user-1", "--db-path"])
        .arg(&db_path)
        .args(["submit", "--file", COMPLETE_FORM, "--draft-id", &draft_id])
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());

    // 3. Third run: exactly one record, now pending
    let output3 = admissions()
        .args(["--owner", "user-1", "--db-path"])
        .arg(&db_path)
        .args(["list", "--format", "csv"])
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output3.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains(&format!("{},pending,Computer Science,", draft_id)));
}

#[test]
fn test_rocksdb_records_are_owner_scoped() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let output = admissions()
        .args(["--owner", "alice", "--db-path"])
        .arg(&db_path)
        .args(["submit", "--file", COMPLETE_FORM])
        .output()
        .unwrap();
    assert!(output.status.success());
    let receipt: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = receipt["application_id"].as_str().unwrap().to_string();

    let other = admissions()
        .args(["--owner", "mallory", "--db-path"])
        .arg(&db_path)
        .args(["show", "--id", &id])
        .output()
        .unwrap();
    assert!(!other.status.success());
    assert!(String::from_utf8_lossy(&other.stderr).contains("not found"));
}
