//! Adapters implementing the domain ports.

pub mod file_recovery;
pub mod http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
