use crate::config::AppConfig;
use crate::domain::ports::HealthProbe;
use crate::error::{Result, ServiceError, TransientCause};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const HEALTHY: &str = "healthy";

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

/// Probes the backend's health function over HTTP.
#[derive(Clone)]
pub struct HttpHealthProbe {
    config: AppConfig,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(config: AppConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ServiceError::Configuration(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            config,
            client,
            timeout,
        })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self) -> Result<()> {
        let base = self.config.require_service_url()?;
        let key = self.config.require_public_key()?;
        let url = format!("{}/functions/v1/health", base);

        let response = self
            .client
            .get(&url)
            .bearer_auth(key)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(if status == StatusCode::SERVICE_UNAVAILABLE {
                ServiceError::TransientNetwork(TransientCause::ServiceUnavailable)
            } else {
                ServiceError::ClientRequest {
                    status: status.as_u16(),
                    message: format!("health check returned HTTP {}", status),
                }
            });
        }

        let body = response.text().await?;
        let parsed: HealthBody =
            serde_json::from_str(&body).map_err(|e| ServiceError::ClientRequest {
                status: status.as_u16(),
                message: format!("malformed health response: {}", e),
            })?;
        if parsed.status != HEALTHY {
            return Err(ServiceError::ClientRequest {
                status: status.as_u16(),
                message: format!("backend reports status '{}'", parsed.status),
            });
        }

        debug!(url, "backend healthy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe(server: &MockServer, timeout: Duration) -> HttpHealthProbe {
        HttpHealthProbe::new(
            AppConfig {
                service_url: Some(server.uri()),
                public_key: Some("anon-key".into()),
                ..AppConfig::default()
            },
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_healthy_body_passes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/functions/v1/health"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .expect(1)
            .mount(&server)
            .await;

        probe(&server, Duration::from_secs(5)).probe().await.unwrap();
    }

    #[tokio::test]
    async fn test_other_status_value_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "degraded"})))
            .mount(&server)
            .await;

        assert!(probe(&server, Duration::from_secs(5)).probe().await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        assert!(matches!(
            probe(&server, Duration::from_secs(5)).probe().await,
            Err(ServiceError::ClientRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_error_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(matches!(
            probe(&server, Duration::from_secs(5)).probe().await,
            Err(ServiceError::ClientRequest { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "healthy"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        assert!(matches!(
            probe(&server, Duration::from_millis(50)).probe().await,
            Err(ServiceError::TransientNetwork(TransientCause::Timeout))
        ));
    }

    #[tokio::test]
    async fn test_missing_configuration_is_fatal() {
        let probe = HttpHealthProbe::new(AppConfig::default(), Duration::from_secs(1)).unwrap();
        assert!(matches!(
            probe.probe().await,
            Err(ServiceError::Configuration(_))
        ));
    }
}
