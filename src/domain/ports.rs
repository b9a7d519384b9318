use super::application::{
    ApplicationChanges, ApplicationId, ApplicationRecord, ApplicationStatus,
};
use super::identity::OwnerId;
use super::payment::{PaymentRequest, PaymentResult, TransactionReference};
use super::recovery::PendingTransactionContext;
use crate::error::Result;
use async_trait::async_trait;

/// Owner-scoped persistence for application records.
///
/// Every read and write is filtered by the owner; there is no separate
/// authorization layer.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert(&self, record: ApplicationRecord) -> Result<()>;

    /// Applies `changes` to the record matching `id`, `owner` and
    /// `expected_status`. Returns the number of rows updated.
    async fn update(
        &self,
        id: ApplicationId,
        owner: &OwnerId,
        expected_status: ApplicationStatus,
        changes: ApplicationChanges,
    ) -> Result<usize>;

    async fn get(&self, id: ApplicationId, owner: &OwnerId) -> Result<Option<ApplicationRecord>>;

    /// All records of `owner`, newest first.
    async fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>>;
}

/// Single-slot store for the transaction context that must survive the
/// trip to the gateway and back.
#[async_trait]
pub trait RecoveryStore: Send + Sync {
    /// Overwrites whatever is stored.
    async fn set(&self, context: PendingTransactionContext) -> Result<()>;

    /// Takes the stored context, leaving the slot empty.
    async fn consume(&self) -> Result<Option<PendingTransactionContext>>;

    /// Takes the stored context only if it belongs to `reference`; a
    /// mismatch leaves the slot untouched.
    async fn consume_for(
        &self,
        reference: &TransactionReference,
    ) -> Result<Option<PendingTransactionContext>>;
}

/// The hosted-checkout payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment and returns the checkout link.
    async fn create_payment(&self, request: &PaymentRequest) -> Result<String>;

    async fn verify_transaction(&self, transaction_id: &str) -> Result<PaymentResult>;
}

/// One liveness probe against the backend.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> Result<()>;
}

pub type ApplicationStoreBox = Box<dyn ApplicationStore>;
pub type RecoveryStoreBox = Box<dyn RecoveryStore>;
pub type ApplicationStoreFactory = Box<dyn Fn() -> ApplicationStoreBox + Send + Sync>;
