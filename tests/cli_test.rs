mod common;

use assert_cmd::prelude::*;
use common::{COMPLETE_FORM, DRAFT_FORM, admissions};
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_help_lists_commands() {
    admissions()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pay"))
        .stdout(predicate::str::contains("confirm"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("draft"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_show_without_identity_asks_to_sign_in() {
    admissions()
        .env("ADMISSIONS_SERVICE_URL", "http://127.0.0.1:9")
        .env("ADMISSIONS_PUBLIC_KEY", "anon-key")
        .args(["show", "--id", "6f1c2a52-3f7e-4d7a-9a55-0c1f4d1b2e11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signed in"));
}

#[test]
fn test_pay_without_backend_configuration_names_the_cause() {
    let dir = tempfile::tempdir().unwrap();
    admissions()
        .env("ADMISSIONS_GATEWAY_SECRET", "sk_test")
        .arg("--session-file")
        .arg(dir.path().join("session.json"))
        .args([
            "pay", "--amount", "150000", "--name", "Ada Obi", "--email",
            "ada@example.com", "--phone", "08012345678",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ADMISSIONS_SERVICE_URL"));
    assert!(!dir.path().join("session.json").exists());
}

#[test]
fn test_submit_without_identity_asks_to_sign_in() {
    admissions()
        .args(["submit", "--file", COMPLETE_FORM])
        .assert()
        .failure()
        .stderr(predicate::str::contains("You must be signed in to continue"));
}

#[test]
fn test_draft_without_backend_configuration_fails() {
    admissions()
        .args(["--owner", "user-1", "draft", "--file", DRAFT_FORM])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ADMISSIONS_SERVICE_URL is not set"));
}

#[test]
fn test_confirm_without_pending_payment_fails_safe() {
    let dir = tempfile::tempdir().unwrap();
    admissions()
        .env("ADMISSIONS_GATEWAY_SECRET", "sk_test")
        .arg("--session-file")
        .arg(dir.path().join("session.json"))
        .args(["confirm", "--tx-ref", "ADM-1-abc", "--transaction-id", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pending transaction"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_exports_owned_applications_as_csv() {
    let server = MockServer::start().await;
    let rows = json!([{
        "id": "6f1c2a52-3f7e-4d7a-9a55-0c1f4d1b2e11",
        "user_id": "user-1",
        "program_selection": {"program": "Computer Science", "level": "100", "start_session": "2025/2026"},
        "status": "pending",
        "created_at": "2025-01-10T09:00:00Z",
        "updated_at": "2025-01-10T09:00:00Z"
    }]);
    Mock::given(method("GET"))
        .and(path("/rest/v1/applications"))
        .and(query_param("user_id", "eq.user-1"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        admissions()
            .env("ADMISSIONS_SERVICE_URL", uri)
            .env("ADMISSIONS_PUBLIC_KEY", "anon-key")
            .env("ADMISSIONS_IDENTITY", "user-1")
            .arg("list")
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("id,status,program,created_at,updated_at"))
        .stdout(predicate::str::contains(
            "6f1c2a52-3f7e-4d7a-9a55-0c1f4d1b2e11,pending,Computer Science,",
        ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_reports_online() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/functions/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;

    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        admissions()
            .env("ADMISSIONS_SERVICE_URL", uri)
            .env("ADMISSIONS_PUBLIC_KEY", "anon-key")
            .arg("health")
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains(r#""state":"online""#));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pay_refused_while_backend_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/functions/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        admissions()
            .env("ADMISSIONS_SERVICE_URL", &uri)
            .env("ADMISSIONS_PUBLIC_KEY", "anon-key")
            .env("ADMISSIONS_GATEWAY_URL", &uri)
            .env("ADMISSIONS_GATEWAY_SECRET", "sk_test")
            .args([
                "pay", "--amount", "150000", "--name", "Ada Obi", "--email",
                "ada@example.com", "--phone", "08012345678",
            ])
            .assert()
    })
    .await
    .unwrap();

    assert
        .failure()
        .stderr(predicate::str::contains("payments are unavailable"));
}
