use crate::domain::application::{
    ApplicationChanges, ApplicationId, ApplicationRecord, ApplicationStatus,
};
use crate::domain::identity::OwnerId;
use crate::domain::payment::TransactionReference;
use crate::domain::ports::{ApplicationStore, RecoveryStore};
use crate::domain::recovery::PendingTransactionContext;
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A thread-safe in-memory store for application records.
///
/// Uses `Arc<RwLock<HashMap<ApplicationId, ApplicationRecord>>>` to allow shared
/// concurrent access. Clones share the same records.
#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    records: Arc<RwLock<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationStore {
    /// Creates a new, empty in-memory application store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all owners.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert(&self, record: ApplicationRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(ServiceError::BackendPersistence(format!(
                "duplicate key value: application {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn update(
        &self,
        id: ApplicationId,
        owner: &OwnerId,
        expected_status: ApplicationStatus,
        changes: ApplicationChanges,
    ) -> Result<usize> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) if record.owner_id == *owner && record.status == expected_status => {
                record.sections = changes.sections;
                record.status = changes.status;
                record.updated_at = changes.updated_at;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn get(&self, id: ApplicationId, owner: &OwnerId) -> Result<Option<ApplicationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&id).filter(|r| r.owner_id == *owner).cloned())
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>> {
        let records = self.records.read().await;
        let mut owned: Vec<ApplicationRecord> = records
            .values()
            .filter(|r| r.owner_id == *owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

/// Single-slot recovery store held in process memory.
#[derive(Default, Clone)]
pub struct InMemoryRecoveryStore {
    slot: Arc<Mutex<Option<PendingTransactionContext>>>,
}

impl InMemoryRecoveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecoveryStore for InMemoryRecoveryStore {
    async fn set(&self, context: PendingTransactionContext) -> Result<()> {
        *self.slot.lock().await = Some(context);
        Ok(())
    }

    async fn consume(&self) -> Result<Option<PendingTransactionContext>> {
        Ok(self.slot.lock().await.take())
    }

    async fn consume_for(
        &self,
        reference: &TransactionReference,
    ) -> Result<Option<PendingTransactionContext>> {
        let mut slot = self.slot.lock().await;
        if slot
            .as_ref()
            .is_some_and(|ctx| ctx.transaction_reference == *reference)
        {
            Ok(slot.take())
        } else {
            Ok(None)
        }
    }
}
