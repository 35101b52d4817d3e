use serde_json::Value;
use thiserror::Error;

/// Failures of the sign-in flows and of token handling.
///
/// `TokenExchangeFailed` and `ProfileFetchFailed` carry whatever the provider
/// answered so the caller can see why it refused.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("authorization code is required")]
    MissingCode,

    #[error("failed to exchange authorization code")]
    TokenExchangeFailed { details: Value },

    #[error("failed to fetch provider profile")]
    ProfileFetchFailed { details: Value },

    #[error("failed to reconcile account: {0}")]
    ReconciliationFailed(String),

    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("failed to issue token: {0}")]
    TokenIssue(String),
}

impl AuthError {
    /// Machine-readable code sent in the `code` field of error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::TokenExchangeFailed { .. } => "token_exchange_failed",
            Self::ProfileFetchFailed { .. } => "profile_fetch_failed",
            Self::ReconciliationFailed(_) => "reconciliation_failed",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::InvalidCredentials => "invalid_credentials",
            Self::TokenIssue(_) => "token_issue_failed",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingCode | Self::TokenExchangeFailed { .. } | Self::ProfileFetchFailed { .. } => 400,
            Self::ReconciliationFailed(_) => 409,
            Self::Unauthenticated(_) | Self::InvalidCredentials => 401,
            Self::TokenIssue(_) => 500,
        }
    }

    /// Provider payload attached to exchange failures.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::TokenExchangeFailed { details } | Self::ProfileFetchFailed { details } => {
                Some(details)
            }
            _ => None,
        }
    }
}
