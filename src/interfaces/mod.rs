//! Edges of the crate: file formats the CLI reads and writes.

pub mod csv;
pub mod form;
