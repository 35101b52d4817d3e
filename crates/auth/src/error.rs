use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use commune_core::storage::{repository_error_code, repository_error_to_status_code, RepositoryError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Auth errors for the commune_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for I/O operations that can't be in the functional core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-in and token failures from the core taxonomy.
    #[error(transparent)]
    Core(#[from] commune_core::auth::AuthError),

    /// Storage failure outside of account reconciliation.
    #[error(transparent)]
    Storage(#[from] RepositoryError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// JSON body of every auth error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AuthError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            AuthError::Core(core_err) => {
                let status = StatusCode::from_u16(core_err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    tracing::error!(code = core_err.code(), error = %core_err, "Auth error");
                } else {
                    tracing::debug!(code = core_err.code(), error = %core_err, "Auth request rejected");
                }
                (
                    status,
                    ErrorBody {
                        error: core_err.to_string(),
                        code: core_err.code(),
                        details: core_err.details().cloned(),
                    },
                )
            }
            AuthError::Storage(repo_err) => {
                let status = StatusCode::from_u16(repository_error_to_status_code(repo_err))
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                tracing::error!(error = %repo_err, "Storage error during auth");
                (
                    status,
                    ErrorBody {
                        error: repo_err.to_string(),
                        code: repository_error_code(repo_err),
                        details: None,
                    },
                )
            }
            AuthError::Config(_) => {
                tracing::error!(error = %self, "Config error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Server configuration error".to_string(),
                        code: "configuration_error",
                        details: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}
