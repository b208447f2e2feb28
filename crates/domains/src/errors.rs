//! # DomainError
//!
//! Centralized error handling for the forum core.
//! Every port and service returns this type; adapters map it to their transport.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Referenced entity absent (e.g., Post, Comment, User)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// Reputation gate failure or unknown voter
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed or missing input (e.g., empty search query, oversized comment)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource already exists (e.g., duplicate community name)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, pool exhausted)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for forum logic.
pub type Result<T> = std::result::Result<T, DomainError>;
