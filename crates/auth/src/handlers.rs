//! HTTP handlers for auth routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use commune_core::auth::{require_code, AuthError as CoreError, Session, TokenKind};
use commune_core::community::PublicProfile;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::extractors::CurrentUser;
use crate::reconcile::{issue_session, reconcile};
use crate::AuthState;

/// Body of `POST /auth/discord/`.
#[derive(Debug, Default, Deserialize)]
pub struct DiscordLoginRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// Body of `POST /auth/refresh/`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Body of `POST /auth/login/`.
#[derive(Debug, Deserialize)]
pub struct PasswordLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Creates the auth router with all authentication routes.
///
/// Routes:
/// - `POST /auth/discord/` - Exchange a Discord authorization code for a session
/// - `POST /auth/login/` - Username and password sign-in
/// - `POST /auth/refresh/` - Trade a refresh token for a new access token
/// - `POST /auth/logout/` - Acknowledge logout (tokens are not revoked)
/// - `GET /auth/me/` - Get current authenticated user
pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/auth/discord/", post(discord_login))
        .route("/auth/login/", post(password_login))
        .route("/auth/refresh/", post(refresh))
        .route("/auth/logout/", post(logout))
        .route("/auth/me/", get(me))
}

async fn discord_login(
    State(state): State<AuthState>,
    payload: Result<Json<DiscordLoginRequest>, JsonRejection>,
) -> Result<Json<Session>, AuthError> {
    // An unreadable body is treated the same as a body without a code.
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let code = require_code(request.code.as_deref())?;

    let profile = state.provider.exchange(code).await?;
    let session = reconcile(state.users.as_ref(), &state.tokens, &profile).await?;

    tracing::info!(
        user_id = %session.user.id,
        provider = state.provider.name(),
        "User signed in"
    );
    Ok(Json(session))
}

async fn password_login(
    State(state): State<AuthState>,
    payload: Result<Json<PasswordLoginRequest>, JsonRejection>,
) -> Result<Json<Session>, AuthError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unreadable login body");
        CoreError::InvalidCredentials
    })?;

    let Some(mut user) = state.users.get_user_by_username(&request.username).await? else {
        return Err(CoreError::InvalidCredentials.into());
    };

    if !user.is_active || !state.passwords.verify(&request.password, &user.password) {
        tracing::debug!(user_id = %user.id, "Password login rejected");
        return Err(CoreError::InvalidCredentials.into());
    }

    user.last_login = Some(chrono::Utc::now());
    state.users.update_user(&user).await?;

    tracing::info!(user_id = %user.id, provider = "password", "User signed in");
    Ok(Json(issue_session(&state.tokens, &user)?))
}

async fn refresh(
    State(state): State<AuthState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, AuthError> {
    let Json(request) = payload
        .map_err(|_| CoreError::Unauthenticated("missing refresh token".to_string()))?;

    let claims = state.tokens.verify(&request.refresh, TokenKind::Refresh)?;

    let user = state
        .users
        .get_user(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| CoreError::Unauthenticated("user not found or inactive".to_string()))?;

    let access = state.tokens.issue(user.id, TokenKind::Access)?;
    Ok(Json(RefreshResponse { access }))
}

async fn logout(CurrentUser(user): CurrentUser) -> Json<LogoutResponse> {
    tracing::info!(user_id = %user.id, "User logged out");
    Json(LogoutResponse { success: true })
}

async fn me(CurrentUser(user): CurrentUser) -> Json<PublicProfile> {
    Json(user.public_profile())
}
