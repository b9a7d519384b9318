use crate::domain::application::{
    ApplicationChanges, ApplicationForm, ApplicationId, ApplicationRecord, ApplicationStatus,
    FinalApplication, SubmissionReceipt,
};
use crate::domain::identity::IdentityGate;
use crate::domain::ports::ApplicationStore;
use crate::error::{Result, ServiceError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Persists drafts and final submissions for the signed-in identity.
///
/// Identity is checked before any store call. Submissions are written once;
/// a backend failure is returned as-is and the caller decides whether to
/// resubmit.
pub struct ApplicationSubmissionService {
    store: Arc<dyn ApplicationStore>,
    identity: Arc<dyn IdentityGate>,
}

impl ApplicationSubmissionService {
    pub fn new(store: Arc<dyn ApplicationStore>, identity: Arc<dyn IdentityGate>) -> Self {
        Self { store, identity }
    }

    /// Saves a partial application. With `existing`, the owned draft is
    /// overwritten in place; otherwise a new draft is created.
    #[instrument(skip(self, form))]
    pub async fn save_draft(
        &self,
        form: ApplicationForm,
        existing: Option<ApplicationId>,
    ) -> Result<ApplicationId> {
        let identity = self.identity.require_identity()?;
        let sections = form.into_sections();

        match existing {
            Some(id) => {
                let changes = ApplicationChanges {
                    sections,
                    status: ApplicationStatus::Draft,
                    updated_at: Utc::now(),
                };
                let updated = self
                    .store
                    .update(id, &identity.id, ApplicationStatus::Draft, changes)
                    .await?;
                if updated == 0 {
                    warn!(%id, owner = %identity.id, "no owned draft matched");
                    return Err(ServiceError::BackendPersistence(format!(
                        "No draft application {} found for this account",
                        id
                    )));
                }
                info!(%id, "draft updated");
                Ok(id)
            }
            None => {
                let record =
                    ApplicationRecord::new(identity.id, sections, ApplicationStatus::Draft);
                let id = record.id;
                self.store.insert(record).await?;
                info!(%id, "draft created");
                Ok(id)
            }
        }
    }

    /// Submits a validated application as a new pending record.
    #[instrument(skip(self, application))]
    pub async fn submit(&self, application: FinalApplication) -> Result<SubmissionReceipt> {
        let identity = self.identity.require_identity()?;
        let record = ApplicationRecord::new(
            identity.id,
            application.into_sections(),
            ApplicationStatus::Pending,
        );
        let application_id = record.id;

        self.store.insert(record).await?;
        info!(%application_id, "application submitted");
        Ok(SubmissionReceipt {
            success: true,
            application_id,
        })
    }

    /// Promotes an owned draft to pending. Only drafts can be promoted.
    #[instrument(skip(self, application))]
    pub async fn submit_draft(
        &self,
        draft_id: ApplicationId,
        application: FinalApplication,
    ) -> Result<SubmissionReceipt> {
        let identity = self.identity.require_identity()?;
        let changes = ApplicationChanges {
            sections: application.into_sections(),
            status: ApplicationStatus::Pending,
            updated_at: Utc::now(),
        };
        let updated = self
            .store
            .update(draft_id, &identity.id, ApplicationStatus::Draft, changes)
            .await?;
        if updated == 0 {
            return Err(ServiceError::BackendPersistence(format!(
                "No draft application {} found for this account",
                draft_id
            )));
        }
        info!(application_id = %draft_id, "draft submitted");
        Ok(SubmissionReceipt {
            success: true,
            application_id: draft_id,
        })
    }

    pub async fn list(&self) -> Result<Vec<ApplicationRecord>> {
        let identity = self.identity.require_identity()?;
        self.store.list(&identity.id).await
    }

    pub async fn get_by_id(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>> {
        let identity = self.identity.require_identity()?;
        self.store.get(id, &identity.id).await
    }
}
