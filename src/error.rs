use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Why a remote call failed in a way that may succeed if repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientCause {
    /// No response within the transport deadline.
    Timeout,
    /// The connection could not be established.
    Connection,
    /// The remote answered HTTP 503.
    ServiceUnavailable,
    /// Any other transport failure.
    Transport(String),
}

impl TransientCause {
    /// Whether the request may have reached the remote before failing.
    ///
    /// A refused connection or an explicit 503 means nothing was processed;
    /// a timeout or a broken transport leaves the outcome unknown.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}

impl fmt::Display for TransientCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Connection => write!(f, "connection failed"),
            Self::ServiceUnavailable => write!(f, "service unavailable (HTTP 503)"),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(admissions::configuration),
        help("set the missing ADMISSIONS_* environment variable")
    )]
    Configuration(String),

    #[error("Network error: {0}")]
    #[diagnostic(code(admissions::transient_network))]
    TransientNetwork(TransientCause),

    #[error("Request rejected ({status}): {message}")]
    #[diagnostic(code(admissions::client_request))]
    ClientRequest { status: u16, message: String },

    #[error("Authorization error: {0}")]
    #[diagnostic(code(admissions::authorization), help("sign in again and retry"))]
    Authorization(String),

    #[error("Persistence error: {0}")]
    #[diagnostic(code(admissions::persistence))]
    BackendPersistence(String),

    #[error("Payment {reference} has an unknown outcome and needs manual reconciliation")]
    #[diagnostic(
        code(admissions::reconciliation_required),
        help("do not pay again; check the gateway dashboard for this reference")
    )]
    ReconciliationRequired { reference: String },

    #[error("Validation error: {0}")]
    #[diagnostic(code(admissions::validation))]
    Validation(String),

    #[error("No pending transaction to confirm")]
    #[diagnostic(code(admissions::no_pending_transaction))]
    NoPendingTransaction,

    #[error("Invalid journey transition from {from} on {event}")]
    #[diagnostic(code(admissions::invalid_transition))]
    InvalidTransition { from: String, event: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether a retry loop may repeat the failed call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Short message suitable for showing to an applicant.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => {
                "The payment service is not configured correctly. Please contact support.".into()
            }
            Self::TransientNetwork(_) => {
                "We could not reach the payment service. Please check your connection and try again."
                    .into()
            }
            Self::ClientRequest { message, .. } => message.clone(),
            Self::Authorization(msg) => msg.clone(),
            Self::BackendPersistence(msg) => msg.clone(),
            Self::ReconciliationRequired { reference } => format!(
                "We could not confirm whether payment {} went through. Please contact support before paying again.",
                reference
            ),
            Self::Validation(msg) => msg.clone(),
            Self::NoPendingTransaction => {
                "We could not find a payment to confirm. If you were charged, please contact support."
                    .into()
            }
            Self::InvalidTransition { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                "Something went wrong. Please try again.".into()
            }
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        // The request was never built, typically from a malformed base URL.
        if e.is_builder() {
            return Self::Configuration(format!("invalid request: {}", e));
        }
        let cause = if e.is_timeout() {
            TransientCause::Timeout
        } else if e.is_connect() {
            TransientCause::Connection
        } else {
            TransientCause::Transport(e.to_string())
        };
        Self::TransientNetwork(cause)
    }
}
