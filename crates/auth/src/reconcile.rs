//! Account reconciliation: map a provider profile onto a local user.

use chrono::Utc;
use commune_core::auth::{
    apply_profile, generate_unusable_password, user_from_profile, AuthError, ExternalProfile,
    Session,
};
use commune_core::community::{validate_user, User};
use commune_core::storage::UserRepository;

use crate::tokens::TokenIssuer;

/// Find the user by external id and refresh it, or create it, then mint a
/// session.
///
/// Storage failures, including username and external id conflicts, become
/// `ReconciliationFailed`. Nothing is retried.
pub async fn reconcile(
    users: &dyn UserRepository,
    tokens: &TokenIssuer,
    profile: &ExternalProfile,
) -> Result<Session, AuthError> {
    let now = Utc::now();

    let existing = users
        .get_user_by_external_id(&profile.external_id)
        .await
        .map_err(reconciliation_failed)?;

    let user = match existing {
        Some(mut user) => {
            apply_profile(&mut user, profile, now);
            validate_user(&user).map_err(reconciliation_failed)?;
            users.update_user(&user).await.map_err(reconciliation_failed)?;
            tracing::info!(user_id = %user.id, external_id = %profile.external_id, "Updated account from provider profile");
            user
        }
        None => {
            let user = user_from_profile(profile, generate_unusable_password(), now);
            validate_user(&user).map_err(reconciliation_failed)?;
            users.create_user(&user).await.map_err(reconciliation_failed)?;
            tracing::info!(user_id = %user.id, external_id = %profile.external_id, "Created account from provider profile");
            user
        }
    };

    issue_session(tokens, &user)
}

/// Mint an access and refresh token pair for the user.
pub fn issue_session(tokens: &TokenIssuer, user: &User) -> Result<Session, AuthError> {
    let (access_token, refresh_token) = tokens.issue_pair(user.id)?;
    Ok(Session {
        user: user.public_profile(),
        access_token,
        refresh_token,
    })
}

fn reconciliation_failed(error: impl std::fmt::Display) -> AuthError {
    tracing::warn!(error = %error, "Account reconciliation failed");
    AuthError::ReconciliationFailed(error.to_string())
}
