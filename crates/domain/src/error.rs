//! Unified error type for domain operations.
//!
//! Kept deliberately small: the engine crate maps these into its own
//! repository errors at the persistence boundary.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g. required field empty, malformed value).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid id format.
    #[error("Invalid id format: {0}")]
    InvalidId(String),

    /// Status transition not allowed.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn illegal_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IllegalTransition {
            from: from.into(),
            to: to.into(),
        }
    }
}
