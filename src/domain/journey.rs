use super::payment::TransactionReference;
use crate::error::{Result, ServiceError};
use std::fmt;

/// Client-visible progress of one application payment.
#[derive(Debug, Clone, PartialEq)]
pub enum JourneyState {
    Draft,
    PendingPayment,
    Redirected { reference: TransactionReference },
    VerifyingTransaction { reference: TransactionReference },
    Confirmed { reference: TransactionReference },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JourneyEvent {
    /// The application was submitted and now awaits payment.
    Submitted,
    /// The gateway issued a checkout link and the payer left for it.
    Redirected(TransactionReference),
    /// The payer came back and verification started.
    Returned,
    Verified,
    Failed(String),
}

impl JourneyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingPayment => "pending_payment",
            Self::Redirected { .. } => "redirected",
            Self::VerifyingTransaction { .. } => "verifying_transaction",
            Self::Confirmed { .. } => "confirmed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Applies an event, rejecting transitions the journey does not allow.
    pub fn apply(self, event: JourneyEvent) -> Result<Self> {
        use JourneyEvent as E;
        use JourneyState as S;

        match (self, event) {
            (S::Draft, E::Submitted) => Ok(S::PendingPayment),
            (S::PendingPayment, E::Redirected(reference)) => Ok(S::Redirected { reference }),
            (S::Redirected { reference }, E::Returned) => Ok(S::VerifyingTransaction { reference }),
            (S::VerifyingTransaction { reference }, E::Verified) => Ok(S::Confirmed { reference }),
            (state, E::Failed(reason)) if !state.is_terminal() => Ok(S::Failed { reason }),
            (state, event) => Err(ServiceError::InvalidTransition {
                from: state.name().to_string(),
                event: format!("{:?}", event),
            }),
        }
    }
}

impl fmt::Display for JourneyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirected { reference }
            | Self::VerifyingTransaction { reference }
            | Self::Confirmed { reference } => write!(f, "{} ({})", self.name(), reference),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_reaches_confirmed() {
        let reference = TransactionReference::from("ADM-1-abc");
        let state = JourneyState::Draft
            .apply(JourneyEvent::Submitted)
            .and_then(|s| s.apply(JourneyEvent::Redirected(reference.clone())))
            .and_then(|s| s.apply(JourneyEvent::Returned))
            .and_then(|s| s.apply(JourneyEvent::Verified))
            .unwrap();
        assert_eq!(state, JourneyState::Confirmed { reference });
        assert!(state.is_terminal());
    }

    #[test]
    fn test_any_live_state_can_fail() {
        let state = JourneyState::PendingPayment
            .apply(JourneyEvent::Failed("gateway down".into()))
            .unwrap();
        assert_eq!(
            state,
            JourneyState::Failed {
                reason: "gateway down".into()
            }
        );
    }

    #[test]
    fn test_terminal_states_reject_events() {
        let confirmed = JourneyState::Confirmed {
            reference: "ADM-1-abc".into(),
        };
        assert!(matches!(
            confirmed.apply(JourneyEvent::Failed("late".into())),
            Err(ServiceError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cannot_skip_verification() {
        let redirected = JourneyState::Redirected {
            reference: "ADM-1-abc".into(),
        };
        assert!(matches!(
            redirected.apply(JourneyEvent::Verified),
            Err(ServiceError::InvalidTransition { .. })
        ));
    }
}
