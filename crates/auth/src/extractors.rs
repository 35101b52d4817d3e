//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use commune_core::auth::{AuthError as CoreError, TokenKind};
use commune_core::community::User;

use crate::error::AuthError;
use crate::AuthState;

/// Extractor for the user behind a valid Bearer access token.
///
/// Rejects with 401 when the header is missing or malformed, the token does
/// not verify, or the user no longer exists or is inactive.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| unauthenticated("missing authorization header"))?
            .to_str()
            .map_err(|_| unauthenticated("invalid authorization header"))?;

        let token = bearer_token(header_value)
            .ok_or_else(|| unauthenticated("authorization header is not a Bearer token"))?;

        let claims = auth_state.tokens.verify(token, TokenKind::Access)?;

        let user = auth_state
            .users
            .get_user(claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| unauthenticated("user not found or inactive"))?;

        Ok(CurrentUser(user))
    }
}

fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn unauthenticated(reason: &str) -> AuthError {
    CoreError::Unauthenticated(reason.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parses_scheme_case_insensitively() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
