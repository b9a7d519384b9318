use crate::error::{Result, ServiceError};
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "https://api.flutterwave.com";
pub const DEFAULT_CONFIRMATION_URL: &str = "http://localhost:3000/payment/confirmation";
pub const DEFAULT_CURRENCY: &str = "NGN";

/// Bounded retry settings shared by the payment client and the
/// confirmation flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Timing of the service-health monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthPolicy {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub check_interval: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            check_interval: Duration::from_secs(60),
        }
    }
}

/// How transaction references are minted across retries of one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// A new reference for every attempt, retries included.
    #[default]
    FreshPerAttempt,
    /// One reference per payment intent. Retries reuse it and ambiguous
    /// timeouts are escalated instead of retried.
    PerIntent,
}

/// Branding sent to the gateway's hosted checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub title: String,
    pub description: String,
    pub logo: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            title: "Admissions Portal".to_string(),
            description: "Tuition payment".to_string(),
            logo: "https://admissions.example.edu/logo.png".to_string(),
        }
    }
}

/// Connection settings for the backend data service and the payment
/// gateway.
///
/// Credentials are optional here: their absence is reported as a
/// configuration error when first needed, not when the process starts.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_url: Option<String>,
    pub public_key: Option<String>,
    pub gateway_url: String,
    pub gateway_secret: Option<String>,
    pub confirmation_url: String,
    pub currency: String,
    pub payment_timeout: Duration,
    pub branding: Branding,
    pub reference_policy: ReferencePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            public_key: None,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_secret: None,
            confirmation_url: DEFAULT_CONFIRMATION_URL.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            payment_timeout: Duration::from_secs(30),
            branding: Branding::default(),
            reference_policy: ReferencePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Reads configuration from `ADMISSIONS_*` environment variables.
    ///
    /// Only malformed values fail here; missing credentials are left as
    /// `None`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let payment_timeout = match non_empty("ADMISSIONS_PAYMENT_TIMEOUT_MS") {
            Some(val) => Duration::from_millis(val.parse::<u64>().map_err(|_| {
                ServiceError::Configuration(format!(
                    "ADMISSIONS_PAYMENT_TIMEOUT_MS invalid: '{}'",
                    val
                ))
            })?),
            None => defaults.payment_timeout,
        };

        let reference_policy = match non_empty("ADMISSIONS_REFERENCE_POLICY").as_deref() {
            None | Some("per-attempt") => ReferencePolicy::FreshPerAttempt,
            Some("per-intent") => ReferencePolicy::PerIntent,
            Some(other) => {
                return Err(ServiceError::Configuration(format!(
                    "ADMISSIONS_REFERENCE_POLICY invalid: '{}'",
                    other
                )));
            }
        };

        let service_url = non_empty("ADMISSIONS_SERVICE_URL")
            .map(|url| base_url("ADMISSIONS_SERVICE_URL", url))
            .transpose()?;
        let gateway_url = match non_empty("ADMISSIONS_GATEWAY_URL") {
            Some(url) => base_url("ADMISSIONS_GATEWAY_URL", url)?,
            None => defaults.gateway_url,
        };

        Ok(Self {
            service_url,
            public_key: non_empty("ADMISSIONS_PUBLIC_KEY"),
            gateway_url,
            gateway_secret: non_empty("ADMISSIONS_GATEWAY_SECRET"),
            confirmation_url: non_empty("ADMISSIONS_CONFIRMATION_URL")
                .unwrap_or(defaults.confirmation_url),
            currency: non_empty("ADMISSIONS_CURRENCY").unwrap_or(defaults.currency),
            payment_timeout,
            branding: defaults.branding,
            reference_policy,
        })
    }

    pub fn require_service_url(&self) -> Result<&str> {
        require(&self.service_url, "ADMISSIONS_SERVICE_URL")
    }

    pub fn require_public_key(&self) -> Result<&str> {
        require(&self.public_key, "ADMISSIONS_PUBLIC_KEY")
    }

    pub fn require_gateway_secret(&self) -> Result<&str> {
        require(&self.gateway_secret, "ADMISSIONS_GATEWAY_SECRET")
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| ServiceError::Configuration(format!("{} is not set", name)))
}

/// Trims the trailing slash and rejects values that are not absolute URLs.
fn base_url(name: &str, url: String) -> Result<String> {
    let trimmed = url.trim_end_matches('/').to_string();
    reqwest::Url::parse(&trimmed).map_err(|e| {
        ServiceError::Configuration(format!("{} invalid: '{}' ({})", name, url, e))
    })?;
    Ok(trimmed)
}
