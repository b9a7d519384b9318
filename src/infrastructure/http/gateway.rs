use crate::config::AppConfig;
use crate::domain::payment::{Customer, PaymentRequest, PaymentResult, PaymentStatus};
use crate::domain::ports::PaymentGateway;
use crate::error::{Result, ServiceError, TransientCause};
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const INVALID_DETAILS: &str = "Invalid payment details. Please check your information and try again.";
pub const GATEWAY_AUTH_FAILED: &str =
    "Payment service authentication failed. The gateway credentials are misconfigured.";
pub const TRY_AGAIN: &str = "Payment request failed. Please try again.";

#[derive(Serialize)]
struct CreatePaymentBody<'a> {
    tx_ref: &'a str,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    amount: Decimal,
    currency: &'a str,
    redirect_url: &'a str,
    customer: CustomerBody<'a>,
    meta: MetaBody<'a>,
    customizations: CustomizationsBody<'a>,
}

#[derive(Serialize)]
struct CustomerBody<'a> {
    email: &'a str,
    name: &'a str,
    phonenumber: &'a str,
}

#[derive(Serialize)]
struct MetaBody<'a> {
    accommodation: &'a str,
    address: &'a str,
}

#[derive(Serialize)]
struct CustomizationsBody<'a> {
    title: &'a str,
    description: &'a str,
    logo: &'a str,
}

impl<'a> From<&'a PaymentRequest> for CreatePaymentBody<'a> {
    fn from(req: &'a PaymentRequest) -> Self {
        Self {
            tx_ref: req.reference.as_str(),
            amount: req.amount.value(),
            currency: &req.currency,
            redirect_url: &req.redirect_target,
            customer: CustomerBody {
                email: &req.customer.email,
                name: &req.customer.name,
                phonenumber: &req.customer.phone,
            },
            meta: MetaBody {
                accommodation: &req.metadata.accommodation,
                address: &req.metadata.address,
            },
            customizations: CustomizationsBody {
                title: &req.branding.title,
                description: &req.branding.description,
                logo: &req.branding.logo,
            },
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct CheckoutLink {
    link: String,
}

#[derive(Deserialize)]
struct VerifiedTransaction {
    id: serde_json::Value,
    tx_ref: String,
    #[serde(default)]
    flw_ref: String,
    amount: Decimal,
    currency: String,
    status: String,
    #[serde(default)]
    customer: Option<VerifiedCustomer>,
}

#[derive(Deserialize)]
struct VerifiedCustomer {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_number: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Maps a non-success gateway response onto the error taxonomy.
///
/// 503 is the only status worth retrying; 401 means our credentials are
/// wrong; 400 carries the gateway's own explanation when it gives one.
pub fn classify_status(status: StatusCode, body: &str) -> ServiceError {
    match status {
        StatusCode::SERVICE_UNAVAILABLE => {
            ServiceError::TransientNetwork(TransientCause::ServiceUnavailable)
        }
        StatusCode::UNAUTHORIZED => ServiceError::Authorization(GATEWAY_AUTH_FAILED.to_string()),
        StatusCode::BAD_REQUEST => {
            let message = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| INVALID_DETAILS.to_string());
            ServiceError::ClientRequest {
                status: status.as_u16(),
                message,
            }
        }
        other => ServiceError::ClientRequest {
            status: other.as_u16(),
            message: TRY_AGAIN.to_string(),
        },
    }
}

/// Client for the hosted-checkout payment gateway (Flutterwave v3 API).
#[derive(Clone)]
pub struct FlutterwaveGateway {
    config: AppConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for FlutterwaveGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlutterwaveGateway")
            .field("gateway_url", &self.config.gateway_url)
            .field("client", &"reqwest::Client")
            .finish()
    }
}

impl FlutterwaveGateway {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.payment_timeout)
            .build()
            .map_err(|e| ServiceError::Configuration(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    async fn read_envelope<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<Envelope<T>> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(http_status = %status, "gateway rejected request");
            return Err(classify_status(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| ServiceError::ClientRequest {
            status: status.as_u16(),
            message: format!("Unexpected response from payment gateway: {}", e),
        })
    }
}

#[async_trait]
impl PaymentGateway for FlutterwaveGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<String> {
        let secret = self.config.require_gateway_secret()?;
        let url = format!("{}/v3/payments", self.config.gateway_url);
        debug!(reference = %request.reference, amount = %request.amount, "creating payment");

        let response = self
            .client
            .post(&url)
            .bearer_auth(secret)
            .json(&CreatePaymentBody::from(request))
            .send()
            .await?;

        let envelope: Envelope<CheckoutLink> = Self::read_envelope(response).await?;
        match envelope.data {
            Some(data) if envelope.status == "success" && !data.link.is_empty() => Ok(data.link),
            _ => Err(ServiceError::ClientRequest {
                status: 200,
                message: envelope
                    .message
                    .unwrap_or_else(|| "Payment gateway did not return a checkout link".to_string()),
            }),
        }
    }

    async fn verify_transaction(&self, transaction_id: &str) -> Result<PaymentResult> {
        if transaction_id.is_empty()
            || !transaction_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ServiceError::Validation(format!(
                "'{}' is not a valid transaction id",
                transaction_id
            )));
        }
        let secret = self.config.require_gateway_secret()?;
        let url = format!(
            "{}/v3/transactions/{}/verify",
            self.config.gateway_url, transaction_id
        );
        debug!(transaction_id, "verifying transaction");

        let response = self.client.get(&url).bearer_auth(secret).send().await?;
        let envelope: Envelope<VerifiedTransaction> = Self::read_envelope(response).await?;
        let data = match envelope.data {
            Some(data) if envelope.status == "success" => data,
            _ => {
                return Err(ServiceError::ClientRequest {
                    status: 200,
                    message: envelope
                        .message
                        .unwrap_or_else(|| "Transaction could not be verified".to_string()),
                });
            }
        };

        let transaction_id = match data.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(PaymentResult {
            status: PaymentStatus::from_gateway(&data.status),
            transaction_id,
            transaction_reference: data.tx_ref.into(),
            gateway_reference: data.flw_ref,
            amount: data.amount,
            currency: data.currency,
            customer: data.customer.map(|c| Customer {
                name: c.name,
                email: c.email,
                phone: c.phone_number.unwrap_or_default(),
            }),
        })
    }
}
