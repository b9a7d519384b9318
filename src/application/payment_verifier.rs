use crate::domain::payment::PaymentResult;
use crate::domain::ports::PaymentGateway;
use crate::error::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Asks the gateway for a transaction's status. One request, no retry.
///
/// The answer is advisory; settlement is recorded by the backend.
pub struct PaymentVerifier {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentVerifier {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn verify_payment(&self, transaction_id: &str) -> Result<PaymentResult> {
        match self.gateway.verify_transaction(transaction_id).await {
            Ok(result) => {
                info!(
                    transaction_id,
                    reference = %result.transaction_reference,
                    status = ?result.status,
                    "transaction verified"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(transaction_id, error = %e, "transaction verification failed");
                Err(e)
            }
        }
    }
}
