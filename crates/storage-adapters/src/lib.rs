//! # storage-adapters
//!
//! Entity store implementations of the `domains` repository ports.
//!
//! - [`memory::MemoryStore`]: always compiled, used by the default binary and tests.
//! - `postgres::PostgresStore`: behind the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PostgresStore;
