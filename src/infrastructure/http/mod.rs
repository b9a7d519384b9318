//! Adapters speaking HTTP to the payment gateway and the backend service.

pub mod gateway;
pub mod health_probe;
pub mod rest_store;
