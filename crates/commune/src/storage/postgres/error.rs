//! PostgreSQL error mapping.
//!
//! Maps `sqlx::Error` to `RepositoryError` from `commune_core::storage`.
//! Constraint violations are mapped to semantic variants.

use commune_core::storage::RepositoryError;

/// Maps a sqlx error to a RepositoryError.
///
/// # Error Mapping
///
/// - unique violation → `RepositoryError::AlreadyExists`
/// - foreign key or check violation → `RepositoryError::InvalidData`
/// - pool and I/O errors → `RepositoryError::ConnectionFailed`
/// - decode errors → `RepositoryError::Serialization`
/// - `RowNotFound` → `RepositoryError::NotFound`
/// - All other errors → `RepositoryError::QueryFailed`
pub fn map_sqlx_error(
    err: sqlx::Error,
    entity_type: &'static str,
    id: impl ToString,
) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::already_exists(entity_type, id)
        }
        sqlx::Error::Database(db_err)
            if db_err.is_foreign_key_violation() || db_err.is_check_violation() =>
        {
            RepositoryError::InvalidData(format!(
                "{entity_type} {}: {}",
                id.to_string(),
                db_err.message()
            ))
        }
        sqlx::Error::RowNotFound => RepositoryError::not_found(entity_type, id),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => RepositoryError::ConnectionFailed(err.to_string()),
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
            RepositoryError::Serialization(err.to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let mapped = map_sqlx_error(sqlx::Error::RowNotFound, "Unit", "abc");

        assert_eq!(mapped, RepositoryError::not_found("Unit", "abc"));
    }

    #[test]
    fn test_pool_errors_map_to_connection_failed() {
        let mapped = map_sqlx_error(sqlx::Error::PoolTimedOut, "User", "abc");

        assert!(matches!(mapped, RepositoryError::ConnectionFailed(_)));
    }

    #[test]
    fn test_decode_errors_map_to_serialization() {
        let mapped = map_sqlx_error(sqlx::Error::Decode("bad role".into()), "Membership", "abc");

        assert!(matches!(mapped, RepositoryError::Serialization(_)));
    }

    #[test]
    fn test_other_errors_map_to_query_failed() {
        let mapped = map_sqlx_error(sqlx::Error::Protocol("unexpected".to_string()), "Event", "abc");

        assert!(matches!(mapped, RepositoryError::QueryFailed(_)));
    }
}
