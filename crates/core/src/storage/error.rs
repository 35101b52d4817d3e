use thiserror::Error;

/// Errors that can occur during repository operations.
///
/// Both backends report the same variant for the same situation, so handlers
/// can map them without knowing which store is compiled in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The record addressed by id (or composite key) does not exist.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    /// A uniqueness rule was broken: username, external id, or a
    /// membership/attendance pair.
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    /// A stored value could not be decoded, e.g. an unknown role string.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The record points at something that does not exist, or would make a
    /// unit its own ancestor.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity_type: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
