use admissions_core::application::confirmation::ConfirmationService;
use admissions_core::application::payment_orchestrator::PaymentOrchestrator;
use admissions_core::application::payment_verifier::PaymentVerifier;
use admissions_core::config::{AppConfig, RetryPolicy};
use admissions_core::domain::journey::JourneyState;
use admissions_core::domain::payment::{Amount, Customer, PaymentDetails, PaymentMetadata};
use admissions_core::domain::ports::RecoveryStore;
use admissions_core::domain::recovery::RedirectParams;
use admissions_core::error::{ServiceError, TransientCause};
use admissions_core::infrastructure::file_recovery::FileRecoveryStore;
use admissions_core::infrastructure::http::gateway::FlutterwaveGateway;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAST_RETRY: RetryPolicy = RetryPolicy {
    max_retries: 3,
    retry_delay: Duration::from_millis(10),
};

struct Harness {
    orchestrator: PaymentOrchestrator,
    confirmation: ConfirmationService,
    recovery: Arc<FileRecoveryStore>,
    _dir: TempDir,
}

fn harness(server: &MockServer) -> Harness {
    let config = AppConfig {
        gateway_url: server.uri(),
        gateway_secret: Some("sk_test".into()),
        ..AppConfig::default()
    };
    let gateway = Arc::new(FlutterwaveGateway::new(config.clone()).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let recovery = Arc::new(FileRecoveryStore::new(dir.path().join("session.json")));

    Harness {
        orchestrator: PaymentOrchestrator::new(
            gateway.clone(),
            recovery.clone(),
            config,
            FAST_RETRY,
        ),
        confirmation: ConfirmationService::new(
            PaymentVerifier::new(gateway),
            recovery.clone(),
            FAST_RETRY,
        ),
        recovery,
        _dir: dir,
    }
}

fn details() -> PaymentDetails {
    PaymentDetails {
        amount: Amount::new(dec!(150000)).unwrap(),
        customer: Customer {
            name: "Ada Obi".into(),
            email: "ada@example.com".into(),
            phone: "08012345678".into(),
        },
        metadata: PaymentMetadata {
            accommodation: "Hostel A".into(),
            address: "12 Allen Avenue".into(),
        },
    }
}

async fn sent_references(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/v3/payments")
        .map(|r| {
            let body: serde_json::Value = r.body_json().unwrap();
            body["tx_ref"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_unavailable_gateway_gets_four_distinct_references() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;
    let h = harness(&server);

    let err = h.orchestrator.initialize_payment(&details()).await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::TransientNetwork(TransientCause::ServiceUnavailable)
    ));
    let references = sent_references(&server).await;
    assert_eq!(references.len(), 4);
    assert_eq!(references.iter().collect::<HashSet<_>>().len(), 4);
    assert!(h.recovery.consume().await.unwrap().is_none());
}

#[tokio::test]
async fn test_bad_request_is_not_retried_and_keeps_gateway_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "message": "Invalid email address",
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);

    let err = h.orchestrator.initialize_payment(&details()).await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid email address");
    assert_eq!(sent_references(&server).await.len(), 1);
}

#[tokio::test]
async fn test_pay_then_confirm_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(header("authorization", "Bearer sk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Hosted Link",
            "data": {"link": "https://checkout.example.com/pay/abc"},
        })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);

    let initiation = h.orchestrator.initialize_payment(&details()).await.unwrap();
    assert_eq!(initiation.link, "https://checkout.example.com/pay/abc");
    assert_eq!(initiation.attempts, 1);

    let body: serde_json::Value = server.received_requests().await.unwrap()[0]
        .body_json()
        .unwrap();
    assert_eq!(body["amount"], json!(150000.0));
    assert_eq!(body["currency"], "NGN");
    assert_eq!(body["customer"]["phonenumber"], "08012345678");
    assert_eq!(body["meta"]["accommodation"], "Hostel A");

    Mock::given(method("GET"))
        .and(path("/v3/transactions/987654/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "id": 987654,
                "tx_ref": initiation.reference.as_str(),
                "flw_ref": "FLW-MOCK-1",
                "amount": 150000,
                "currency": "NGN",
                "status": "successful",
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let confirmation = h
        .confirmation
        .confirm(&RedirectParams {
            tx_ref: initiation.reference.to_string(),
            transaction_id: Some("987654".into()),
            status: Some("successful".into()),
        })
        .await
        .unwrap();

    assert_eq!(
        confirmation.state,
        JourneyState::Confirmed {
            reference: initiation.reference.clone()
        }
    );
    // The context is single use.
    assert!(h.recovery.consume().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancelled_checkout_never_calls_verify() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"link": "https://checkout.example.com/pay/xyz"},
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(&server);

    let initiation = h.orchestrator.initialize_payment(&details()).await.unwrap();
    let confirmation = h
        .confirmation
        .confirm(&RedirectParams {
            tx_ref: initiation.reference.to_string(),
            transaction_id: None,
            status: Some("cancelled".into()),
        })
        .await
        .unwrap();

    assert!(matches!(confirmation.state, JourneyState::Failed { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_gateway_url_fails_fast_under_both_policies() {
    use admissions_core::config::ReferencePolicy;
    use admissions_core::infrastructure::in_memory::InMemoryRecoveryStore;

    for policy in [ReferencePolicy::FreshPerAttempt, ReferencePolicy::PerIntent] {
        let config = AppConfig {
            gateway_url: "not a url".into(),
            gateway_secret: Some("sk_test".into()),
            reference_policy: policy,
            ..AppConfig::default()
        };
        let gateway = Arc::new(FlutterwaveGateway::new(config.clone()).unwrap());
        let recovery = Arc::new(InMemoryRecoveryStore::new());
        let orchestrator =
            PaymentOrchestrator::new(gateway, recovery.clone(), config, RetryPolicy::default());
        let start = tokio::time::Instant::now();

        let err = orchestrator.initialize_payment(&details()).await.unwrap_err();

        assert!(
            matches!(err, ServiceError::Configuration(_)),
            "{:?} returned {:?}",
            policy,
            err
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(recovery.consume().await.unwrap().is_none());
    }
}
