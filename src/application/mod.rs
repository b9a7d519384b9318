//! Application services orchestrating the domain over the ports.
//!
//! Each service owns its collaborators as `Arc<dyn Port>` so the CLI and
//! the tests can swap adapters freely.

pub mod confirmation;
pub mod health_monitor;
pub mod payment_orchestrator;
pub mod payment_verifier;
pub mod submission;
