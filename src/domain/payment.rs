use crate::error::ServiceError;
use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-minted token identifying one payment attempt at the gateway.
///
/// Rendered as `{prefix}-{timestamp_ms}-{random}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionReference(String);

impl TransactionReference {
    pub const DEFAULT_PREFIX: &'static str = "ADM";
    const RANDOM_LEN: usize = 10;

    /// Mints a fresh reference.
    pub fn generate(prefix: &str) -> Self {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::RANDOM_LEN)
            .map(char::from)
            .collect();
        Self(format!(
            "{}-{}-{}",
            prefix,
            Utc::now().timestamp_millis(),
            random
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TransactionReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TransactionReference {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TransactionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positive monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, ServiceError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ServiceError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ServiceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub accommodation: String,
    pub address: String,
}

/// What the caller supplies to start a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDetails {
    pub amount: Amount,
    pub customer: Customer,
    pub metadata: PaymentMetadata,
}

/// A fully assembled payment-initiation request.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub reference: TransactionReference,
    pub amount: Amount,
    pub currency: String,
    pub customer: Customer,
    pub redirect_target: String,
    pub metadata: PaymentMetadata,
    pub branding: crate::config::Branding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    /// Maps the gateway's transaction status vocabulary.
    pub fn from_gateway(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "successful" | "success" | "completed" => Self::Success,
            "failed" | "cancelled" | "canceled" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Advisory outcome of a transaction verification.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentResult {
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub transaction_reference: TransactionReference,
    pub gateway_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub customer: Option<Customer>,
}

/// Returned once the gateway has accepted a payment and issued a checkout
/// link. The caller performs the navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInitiation {
    pub reference: TransactionReference,
    pub link: String,
    pub attempts: u32,
}
