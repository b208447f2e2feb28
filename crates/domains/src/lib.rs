//! # domains
//!
//! Entities, errors and port traits of the forum core.
//! This crate does no I/O; stores and transports live in the adapter crates.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
