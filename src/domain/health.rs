use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Checking,
    Online,
    Offline,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Checking => "checking",
            Self::Online => "online",
            Self::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of backend reachability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub state: HealthState,
    /// Consecutive scheduled retries, bounded by the policy's `max_retries`.
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// Set when the last failure was missing configuration, which is never
    /// retried.
    pub fatal: bool,
}

impl HealthSnapshot {
    pub fn checking() -> Self {
        Self {
            state: HealthState::Checking,
            retry_count: 0,
            last_error: None,
            fatal: false,
        }
    }

    /// Payment-dependent actions are only enabled while online.
    pub fn permits_payment(&self) -> bool {
        self.state == HealthState::Online
    }
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self::checking()
    }
}
