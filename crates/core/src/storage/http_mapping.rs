//! HTTP status and error codes for [`RepositoryError`].
//!
//! Shared by the auth routes and the community handlers so both render storage
//! failures the same way.

use super::RepositoryError;

/// HTTP status for a storage failure.
///
/// Missing records are 404, broken uniqueness is 409 and dangling references
/// are 400. An unreachable store is 503; anything else the store reports is
/// a 500.
///
/// ```
/// use commune_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::not_found("Unit", "abc-123");
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::InvalidData(_) => 400,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) | RepositoryError::Serialization(_) => 500,
    }
}

/// Machine-readable code placed in the `code` field of error bodies.
pub fn repository_error_code(error: &RepositoryError) -> &'static str {
    match error {
        RepositoryError::NotFound { .. } => "not_found",
        RepositoryError::AlreadyExists { .. } => "conflict",
        RepositoryError::InvalidData(_) => "invalid_data",
        RepositoryError::ConnectionFailed(_) => "storage_unavailable",
        RepositoryError::QueryFailed(_) | RepositoryError::Serialization(_) => "storage_error",
    }
}
