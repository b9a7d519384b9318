use super::payment::{Amount, Customer, PaymentStatus, TransactionReference};
use serde::{Deserialize, Serialize};

/// What must survive the round trip through the gateway's checkout page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransactionContext {
    pub transaction_reference: TransactionReference,
    pub amount: Amount,
    pub currency: String,
    pub status: PaymentStatus,
    pub customer: Customer,
}

/// Query parameters the gateway appends when sending the payer back.
///
/// None of these prove payment on their own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedirectParams {
    pub tx_ref: String,
    pub transaction_id: Option<String>,
    pub status: Option<String>,
}

impl RedirectParams {
    pub fn was_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }
}
