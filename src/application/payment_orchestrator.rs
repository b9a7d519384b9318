use crate::config::{AppConfig, ReferencePolicy, RetryPolicy};
use crate::domain::payment::{
    PaymentDetails, PaymentInitiation, PaymentRequest, PaymentStatus, TransactionReference,
};
use crate::domain::ports::{PaymentGateway, RecoveryStore};
use crate::domain::recovery::PendingTransactionContext;
use crate::error::{Result, ServiceError};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Starts tuition payments at the gateway.
///
/// The orchestrator only obtains the checkout link; navigating to it is
/// the caller's job. Before returning the link it records the pending
/// transaction so the confirmation step can pick it up after the redirect.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    recovery: Arc<dyn RecoveryStore>,
    config: AppConfig,
    retry: RetryPolicy,
    reference_prefix: String,
}

impl PaymentOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        recovery: Arc<dyn RecoveryStore>,
        config: AppConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            recovery,
            config,
            retry,
            reference_prefix: TransactionReference::DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = prefix.into();
        self
    }

    pub fn build_request(
        &self,
        details: &PaymentDetails,
        reference: TransactionReference,
    ) -> PaymentRequest {
        PaymentRequest {
            reference,
            amount: details.amount,
            currency: self.config.currency.clone(),
            customer: details.customer.clone(),
            redirect_target: self.config.confirmation_url.clone(),
            metadata: details.metadata.clone(),
            branding: self.config.branding.clone(),
        }
    }

    /// Creates a payment, retrying transient failures up to
    /// `max_retries` times with `retry_delay` between attempts.
    ///
    /// 401, 400 and any other non-503 status are returned without retry.
    pub async fn initialize_payment(&self, details: &PaymentDetails) -> Result<PaymentInitiation> {
        let policy = self.config.reference_policy;
        let intent_reference = TransactionReference::generate(&self.reference_prefix);
        let mut attempt: u32 = 0;

        loop {
            let reference = match policy {
                ReferencePolicy::PerIntent => intent_reference.clone(),
                ReferencePolicy::FreshPerAttempt if attempt == 0 => intent_reference.clone(),
                ReferencePolicy::FreshPerAttempt => {
                    TransactionReference::generate(&self.reference_prefix)
                }
            };
            let request = self.build_request(details, reference.clone());
            info!(attempt, reference = %reference, amount = %details.amount, "initializing payment");

            match self.gateway.create_payment(&request).await {
                Ok(link) => {
                    self.recovery
                        .set(PendingTransactionContext {
                            transaction_reference: reference.clone(),
                            amount: details.amount,
                            currency: request.currency.clone(),
                            status: PaymentStatus::Pending,
                            customer: details.customer.clone(),
                        })
                        .await?;
                    info!(reference = %reference, attempts = attempt + 1, "payment link issued");
                    return Ok(PaymentInitiation {
                        reference,
                        link,
                        attempts: attempt + 1,
                    });
                }
                Err(ServiceError::TransientNetwork(cause)) => {
                    if policy == ReferencePolicy::PerIntent && cause.is_ambiguous() {
                        error!(
                            reference = %reference,
                            cause = %cause,
                            "payment outcome unknown, escalating for reconciliation"
                        );
                        return Err(ServiceError::ReconciliationRequired {
                            reference: reference.to_string(),
                        });
                    }
                    if attempt >= self.retry.max_retries {
                        error!(
                            max_retries = self.retry.max_retries,
                            cause = %cause,
                            "all retries exhausted for payment initialization"
                        );
                        return Err(ServiceError::TransientNetwork(cause));
                    }
                    warn!(attempt, cause = %cause, "retryable error initializing payment");
                    tokio::time::sleep(self.retry.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(error = %e, "non-retryable error initializing payment");
                    return Err(e);
                }
            }
        }
    }
}
