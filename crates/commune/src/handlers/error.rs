use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use commune_auth::ErrorBody;
use commune_core::community::{AnnouncementError, EventError, UnitError, UserError};
use commune_core::storage::{repository_error_code, repository_error_to_status_code, RepositoryError};

/// Handler error. Renders as `{ error, code }` JSON.
///
/// Storage errors keep their own status mapping, validation errors and
/// unreadable bodies become 400, anything else is a 500.
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        if let Some(repo_error) = self.0.downcast_ref::<RepositoryError>() {
            let status = StatusCode::from_u16(repository_error_to_status_code(repo_error))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, repository_error_code(repo_error));
        }

        if self.0.is::<UnitError>()
            || self.0.is::<EventError>()
            || self.0.is::<AnnouncementError>()
            || self.0.is::<UserError>()
        {
            return (StatusCode::BAD_REQUEST, "validation_error");
        }

        if let Some(rejection) = self.0.downcast_ref::<JsonRejection>() {
            return (rejection.status(), "invalid_body");
        }

        (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let error = if code == "internal_error" {
            tracing::error!(error = %self.0, "Unhandled error");
            "Internal server error".to_string()
        } else {
            if status.is_server_error() {
                tracing::error!(code, error = %self.0, "Request failed");
            } else {
                tracing::debug!(code, error = %self.0, "Request rejected");
            }
            self.0.to_string()
        };

        let body = ErrorBody {
            error,
            code,
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// 404 for a record addressed by the request path.
pub fn not_found(entity_type: &'static str, id: impl ToString) -> AppError {
    RepositoryError::not_found(entity_type, id).into()
}
