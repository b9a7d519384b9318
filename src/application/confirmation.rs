use crate::application::payment_verifier::PaymentVerifier;
use crate::config::RetryPolicy;
use crate::domain::journey::{JourneyEvent, JourneyState};
use crate::domain::payment::{PaymentResult, PaymentStatus, TransactionReference};
use crate::domain::ports::RecoveryStore;
use crate::domain::recovery::{PendingTransactionContext, RedirectParams};
use crate::error::{Result, ServiceError};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Terminal outcome of a return from the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub state: JourneyState,
    pub result: Option<PaymentResult>,
}

impl Confirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.state, JourneyState::Confirmed { .. })
    }
}

/// Handles the payer's return from the gateway: recovers the pending
/// transaction, verifies it and settles the journey on Confirmed or Failed.
///
/// The redirect's query parameters are never trusted on their own; a
/// return without a matching stored context fails.
pub struct ConfirmationService {
    verifier: PaymentVerifier,
    recovery: Arc<dyn RecoveryStore>,
    retry: RetryPolicy,
}

impl ConfirmationService {
    pub fn new(
        verifier: PaymentVerifier,
        recovery: Arc<dyn RecoveryStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            verifier,
            recovery,
            retry,
        }
    }

    pub async fn confirm(&self, redirect: &RedirectParams) -> Result<Confirmation> {
        let echoed = TransactionReference::from(redirect.tx_ref.as_str());
        let Some(ctx) = self.recovery.consume_for(&echoed).await? else {
            warn!(reference = %echoed, "no pending transaction matches the redirect");
            return Err(ServiceError::NoPendingTransaction);
        };

        let verifying = JourneyState::Redirected {
            reference: ctx.transaction_reference.clone(),
        }
        .apply(JourneyEvent::Returned)?;

        if redirect.was_cancelled() {
            info!(reference = %ctx.transaction_reference, "payer cancelled at the gateway");
            return Self::settle(verifying, None, Some("Payment was cancelled".into()));
        }
        let Some(transaction_id) = redirect.transaction_id.as_deref() else {
            return Self::settle(
                verifying,
                None,
                Some("The payment gateway did not return a transaction id".into()),
            );
        };

        let result = match self.verify_with_retry(transaction_id).await {
            Ok(result) => result,
            Err(e) => {
                // Keep the context so the payer can retry the confirmation.
                self.recovery.set(ctx).await?;
                return Err(e);
            }
        };

        let failure = match Self::check(&ctx, &result) {
            Ok(()) => None,
            Err(reason) => {
                if result.status == PaymentStatus::Pending {
                    self.recovery.set(ctx.clone()).await?;
                }
                Some(reason)
            }
        };
        Self::settle(verifying, Some(result), failure)
    }

    /// The reason the payment cannot be confirmed, if any.
    fn check(
        ctx: &PendingTransactionContext,
        result: &PaymentResult,
    ) -> std::result::Result<(), String> {
        match result.status {
            PaymentStatus::Pending => return Err("Payment is still pending".into()),
            PaymentStatus::Failed => return Err("Payment was not successful".into()),
            PaymentStatus::Success => {}
        }
        if result.transaction_reference != ctx.transaction_reference {
            return Err(format!(
                "Transaction reference mismatch: expected {}, gateway reported {}",
                ctx.transaction_reference, result.transaction_reference
            ));
        }
        if !result.currency.eq_ignore_ascii_case(&ctx.currency) {
            return Err(format!(
                "Currency mismatch: expected {}, gateway reported {}",
                ctx.currency, result.currency
            ));
        }
        if result.amount < ctx.amount.value() {
            return Err(format!(
                "Amount paid ({}) is less than the amount due ({})",
                result.amount, ctx.amount
            ));
        }
        Ok(())
    }

    fn settle(
        verifying: JourneyState,
        result: Option<PaymentResult>,
        failure: Option<String>,
    ) -> Result<Confirmation> {
        let state = match failure {
            None => verifying.apply(JourneyEvent::Verified)?,
            Some(reason) => {
                warn!(reason = %reason, "payment not confirmed");
                verifying.apply(JourneyEvent::Failed(reason))?
            }
        };
        info!(state = %state, "payment journey settled");
        Ok(Confirmation { state, result })
    }

    async fn verify_with_retry(&self, transaction_id: &str) -> Result<PaymentResult> {
        let mut attempt = 0;
        loop {
            match self.verifier.verify_payment(transaction_id).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "retrying transaction verification");
                    tokio::time::sleep(self.retry.retry_delay).await;
                }
                Err(e) => {
                    error!(attempts = attempt + 1, error = %e, "could not verify transaction");
                    return Err(e);
                }
            }
        }
    }
}
