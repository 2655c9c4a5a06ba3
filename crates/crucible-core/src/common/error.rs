//! Error types for the compilation job service.
//!
//! This module defines the central `Error` enum, which captures all
//! recoverable and reportable error cases within the job system.
//!
//! ## Error Cases
//! - `InvalidRequest`: The submission was malformed (missing or empty
//!   sources); rejected before any job exists.
//! - `NotFound`: A status or artifact query named an unknown job id.
//! - `DuplicateId`: The store was asked to create a job id that already
//!   exists. Structurally impossible with correct id generation; treated
//!   as a broken uniqueness guarantee, not a normal error path.
//! - `AlreadyResolved`: A second resolution was attempted for a job that
//!   already left `Pending`. Indicates a broken single-resolution
//!   discipline.
//! - `ChannelError`: An internal communication failure between tasks or
//!   workers.
//! - `ServiceShutdown`: A request arrived while the service was shutting
//!   down.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the compilation job service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// The submission was invalid or exceeded constraints.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// No job exists under the given id.
    #[error("Job not found: {id}")]
    NotFound { id: String },

    /// A job with this id already exists in the store.
    #[error("Duplicate job id: {id}")]
    DuplicateId { id: String },

    /// The job was already resolved to a terminal state.
    #[error("Job already resolved: {id}")]
    AlreadyResolved { id: String },

    /// Internal channel send/receive failure (e.g., closed or full channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    /// True for the invariant-violation variants that signal a broken
    /// uniqueness or lifecycle guarantee rather than a client mistake.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::DuplicateId { .. } | Error::AlreadyResolved { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_violations_are_flagged() {
        assert!(
            Error::DuplicateId {
                id: "tmp0".to_string()
            }
            .is_invariant_violation()
        );
        assert!(
            Error::AlreadyResolved {
                id: "tmp0".to_string()
            }
            .is_invariant_violation()
        );
        assert!(
            !Error::InvalidRequest {
                reason: "empty".to_string()
            }
            .is_invariant_violation()
        );
        assert!(!Error::ServiceShutdown.is_invariant_violation());
    }

    #[test]
    fn display_includes_context() {
        let err = Error::NotFound {
            id: "tmpdeadbeef".to_string(),
        };
        assert_eq!(err.to_string(), "Job not found: tmpdeadbeef");
    }
}
