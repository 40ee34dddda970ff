//! Error types for port operations.

use accord_domain::DomainError;

/// Errors surfaced by the underlying path store.
///
/// Read timeouts are deliberately not an error: the store gives no
/// delivery guarantee, so silence resolves to absence at the client.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store nacked a write (version or format rejection).
    #[error("Write rejected at {path}: {message}")]
    Rejected { path: String, message: String },

    /// A stored value could not be decoded into its entity type.
    #[error("Decode error at {path}: {message}")]
    Decode { path: String, message: String },

    /// The store connection is gone.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn rejected(path: impl ToString, message: impl ToString) -> Self {
        Self::Rejected {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn decode(path: impl ToString, message: impl ToString) -> Self {
        Self::Decode {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - covers both explicit absence and a read that
    /// timed out, which callers treat identically.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Malformed input, rejected before any store call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The store nacked a write. Not retried here; retry safety depends
    /// on the idempotence of the specific write, which the caller knows.
    #[error("Write conflict at {path}: {message}")]
    WriteConflict { path: String, message: String },

    /// Status state-machine violation, rejected before any store call.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    /// Any other store-level failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl RepoError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl ToString) -> Self {
        Self::Validation(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected { path, message } => Self::WriteConflict { path, message },
            other => Self::Store(other),
        }
    }
}

impl From<DomainError> for RepoError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::IllegalTransition { from, to } => Self::IllegalTransition { from, to },
        }
    }
}

/// Errors from the outbound notification service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification send failed: {0}")]
    SendFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_write_becomes_write_conflict() {
        let err: RepoError = StoreError::rejected("games/g_1", "version mismatch").into();
        assert!(matches!(err, RepoError::WriteConflict { .. }));
    }

    #[test]
    fn domain_transition_maps_to_illegal_transition() {
        let err: RepoError = DomainError::illegal_transition("completed", "active").into();
        assert!(matches!(err, RepoError::IllegalTransition { .. }));
    }
}
