use crate::config::AppConfig;
use crate::domain::application::{
    ApplicationChanges, ApplicationId, ApplicationRecord, ApplicationStatus,
};
use crate::domain::identity::OwnerId;
use crate::domain::ports::ApplicationStore;
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

pub const APPLICATIONS_TABLE: &str = "applications";

#[derive(Deserialize)]
struct BackendError {
    message: Option<String>,
}

/// Application records kept by the backend data service's REST interface
/// (PostgREST conventions: `col=eq.value` filters, `Prefer` headers).
#[derive(Clone)]
pub struct RestApplicationStore {
    config: AppConfig,
    client: reqwest::Client,
}

impl RestApplicationStore {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.payment_timeout)
            .build()
            .map_err(|e| ServiceError::Configuration(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn request(&self, method: reqwest::Method) -> Result<reqwest::RequestBuilder> {
        let base = self.config.require_service_url()?;
        let key = self.config.require_public_key()?;
        let url = format!("{}/rest/v1/{}", base, APPLICATIONS_TABLE);
        Ok(self
            .client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key))
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String> {
        let response = builder
            .send()
            .await
            .map_err(|e| ServiceError::BackendPersistence(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::BackendPersistence(e.to_string()))?;
        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<BackendError>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);
        error!(http_status = %status, message = %message, "backend rejected application request");
        Err(ServiceError::BackendPersistence(message))
    }

    fn parse_rows(body: &str) -> Result<Vec<ApplicationRecord>> {
        serde_json::from_str(body).map_err(|e| {
            ServiceError::BackendPersistence(format!("unreadable application rows: {}", e))
        })
    }
}

#[async_trait]
impl ApplicationStore for RestApplicationStore {
    async fn insert(&self, record: ApplicationRecord) -> Result<()> {
        debug!(id = %record.id, status = %record.status, "inserting application");
        let builder = self
            .request(reqwest::Method::POST)?
            .header("Prefer", "return=minimal")
            .json(&record);
        self.send(builder).await?;
        Ok(())
    }

    async fn update(
        &self,
        id: ApplicationId,
        owner: &OwnerId,
        expected_status: ApplicationStatus,
        changes: ApplicationChanges,
    ) -> Result<usize> {
        debug!(%id, owner = %owner, "updating application");
        let builder = self
            .request(reqwest::Method::PATCH)?
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", owner)),
                ("status", format!("eq.{}", expected_status)),
            ])
            .header("Prefer", "return=representation")
            .json(&changes);
        let body = self.send(builder).await?;
        Ok(Self::parse_rows(&body)?.len())
    }

    async fn get(&self, id: ApplicationId, owner: &OwnerId) -> Result<Option<ApplicationRecord>> {
        let builder = self.request(reqwest::Method::GET)?.query(&[
            ("select", "*".to_string()),
            ("id", format!("eq.{}", id)),
            ("user_id", format!("eq.{}", owner)),
        ]);
        let body = self.send(builder).await?;
        Ok(Self::parse_rows(&body)?.into_iter().next())
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>> {
        let builder = self.request(reqwest::Method::GET)?.query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", owner)),
            ("order", "created_at.desc".to_string()),
        ]);
        let body = self.send(builder).await?;
        Self::parse_rows(&body)
    }
}
