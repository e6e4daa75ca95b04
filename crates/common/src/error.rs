//! Cross-service error taxonomy.

use thiserror::Error;

/// Failure modes shared by every participating service.
///
/// REST handlers translate each variant to a fixed HTTP status; event
/// consumers use [`CoreError::is_event_retryable`] to decide between
/// bounded retry and discard. No variant is used as ordinary control
/// flow — each is a distinguishable outcome the caller must check.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity absent. 404 over REST; discarded without retry on the
    /// event path, because redelivery cannot change the outcome.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate idempotency key or duplicate unique relation. 409.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed input or invariant violation (e.g. negative inventory).
    /// 400 over REST; retryable on the event path since it may reflect
    /// transient ordering.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Operation not permitted for the entity's current status. 409.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Ownership mismatch. 401.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected failure. 500; retryable transient.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether an event consumer should retry after this failure.
    ///
    /// NotFound is terminal: the message is discarded and logged.
    /// Everything else goes through the bounded retry policy.
    pub fn is_event_retryable(&self) -> bool {
        !matches!(self, CoreError::NotFound(_))
    }
}

/// Convenience alias used across the service crates.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_retryable() {
        assert!(!CoreError::NotFound("order x".into()).is_event_retryable());
    }

    #[test]
    fn other_failures_are_retryable() {
        assert!(CoreError::Conflict("dup".into()).is_event_retryable());
        assert!(CoreError::InvalidData("neg".into()).is_event_retryable());
        assert!(CoreError::InvalidState("terminal".into()).is_event_retryable());
        assert!(CoreError::Unauthorized("owner".into()).is_event_retryable());
        assert!(CoreError::Internal("boom".into()).is_event_retryable());
    }

    #[test]
    fn display_includes_reason() {
        let err = CoreError::Conflict("idempotency key k1 already used".into());
        assert_eq!(err.to_string(), "conflict: idempotency key k1 already used");
    }
}
