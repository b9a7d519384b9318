//! Domain types and the ports the application layer talks through.

pub mod application;
pub mod health;
pub mod identity;
pub mod journey;
pub mod payment;
pub mod ports;
pub mod recovery;
