#![allow(dead_code)]

use assert_cmd::cargo_bin;
use std::process::Command;

pub const COMPLETE_FORM: &str = "tests/fixtures/application.json";
pub const DRAFT_FORM: &str = "tests/fixtures/draft.json";

const ENV_KEYS: [&str; 9] = [
    "ADMISSIONS_SERVICE_URL",
    "ADMISSIONS_PUBLIC_KEY",
    "ADMISSIONS_GATEWAY_URL",
    "ADMISSIONS_GATEWAY_SECRET",
    "ADMISSIONS_CONFIRMATION_URL",
    "ADMISSIONS_CURRENCY",
    "ADMISSIONS_PAYMENT_TIMEOUT_MS",
    "ADMISSIONS_REFERENCE_POLICY",
    "ADMISSIONS_IDENTITY",
];

/// The CLI binary with no inherited `ADMISSIONS_*` configuration.
pub fn admissions() -> Command {
    let mut cmd = Command::new(cargo_bin!("admissions"));
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn form_json(path: &str) -> serde_json::Value {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}
