use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use uuid::Uuid;

use super::{AuthError, ExternalProfile, TokenClaims, TokenKind};
use crate::community::User;

/// Marker prefix of passwords that can never verify.
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a random JWT id.
pub fn generate_token_id() -> String {
    random_alphanumeric(32)
}

/// Generate a password value that no login attempt can match.
pub fn generate_unusable_password() -> String {
    format!("{UNUSABLE_PASSWORD_PREFIX}{}", random_alphanumeric(40))
}

/// Returns false for unusable markers and empty values.
pub fn is_usable_password(password: &str) -> bool {
    !password.is_empty() && !password.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// Rejects a missing or blank authorization code.
pub fn require_code(code: Option<&str>) -> Result<&str, AuthError> {
    match code.map(str::trim) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(AuthError::MissingCode),
    }
}

/// Build the CDN URL of a provider avatar.
///
/// Returns None when the provider reports no avatar hash.
pub fn avatar_url(cdn_base: &str, external_id: &str, avatar_hash: Option<&str>) -> Option<String> {
    let hash = avatar_hash.filter(|hash| !hash.is_empty())?;
    Some(format!(
        "{}/avatars/{external_id}/{hash}.png",
        cdn_base.trim_end_matches('/')
    ))
}

/// Overwrite a known user's identity fields with the latest provider values
/// and stamp the login.
pub fn apply_profile(user: &mut User, profile: &ExternalProfile, now: DateTime<Utc>) {
    user.username = profile.username.clone();
    user.email = profile.email.clone();
    user.avatar_url = profile.avatar_url.clone();
    user.last_login = Some(now);
}

/// Build a first-login account from a provider profile.
pub fn user_from_profile(profile: &ExternalProfile, password: String, now: DateTime<Utc>) -> User {
    User::new(profile.username.clone(), password, now)
        .with_email(profile.email.clone())
        .with_external_id(profile.external_id.clone())
        .with_avatar_url(profile.avatar_url.clone())
        .with_last_login(now)
}

/// Claims for a token of `kind` issued at `now` and valid for `ttl`.
///
/// Fails with `TokenIssue` when `now + ttl` is outside the representable
/// time range.
pub fn build_claims(
    user_id: Uuid,
    kind: TokenKind,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<TokenClaims, AuthError> {
    let expires = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AuthError::TokenIssue(format!("{kind} token lifetime out of range")))?;

    Ok(TokenClaims {
        sub: user_id,
        token_type: kind,
        jti: generate_token_id(),
        iat: now.timestamp(),
        exp: expires.timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ExternalProfile {
        ExternalProfile {
            external_id: "999".to_string(),
            username: "nova".to_string(),
            email: Some("nova@example.com".to_string()),
            avatar_url: Some("https://cdn.example/avatars/999/h4sh.png".to_string()),
        }
    }

    #[test]
    fn generate_token_id_is_32_alphanumeric_chars() {
        let id = generate_token_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_token_id());
    }

    #[test]
    fn unusable_password_is_never_usable() {
        let password = generate_unusable_password();
        assert!(password.starts_with('!'));
        assert_eq!(password.len(), 41);
        assert!(!is_usable_password(&password));
        assert!(!is_usable_password(""));
        assert!(is_usable_password("$argon2id$v=19$m=19456,t=2,p=1$abc$def"));
    }

    #[test]
    fn require_code_rejects_missing_and_blank() {
        assert_eq!(require_code(None), Err(AuthError::MissingCode));
        assert_eq!(require_code(Some("")), Err(AuthError::MissingCode));
        assert_eq!(require_code(Some("   ")), Err(AuthError::MissingCode));
        assert_eq!(require_code(Some("abc123")), Ok("abc123"));
    }

    #[test]
    fn avatar_url_formats_cdn_path() {
        assert_eq!(
            avatar_url("https://cdn.discordapp.com/", "999", Some("h4sh")).as_deref(),
            Some("https://cdn.discordapp.com/avatars/999/h4sh.png")
        );
    }

    #[test]
    fn avatar_url_absent_without_hash() {
        assert_eq!(avatar_url("https://cdn.discordapp.com", "999", None), None);
        assert_eq!(avatar_url("https://cdn.discordapp.com", "999", Some("")), None);
    }

    #[test]
    fn user_from_profile_stamps_join_and_login() {
        let now = Utc::now();
        let user = user_from_profile(&profile(), generate_unusable_password(), now);

        assert_eq!(user.external_id.as_deref(), Some("999"));
        assert_eq!(user.username, "nova");
        assert!(user.is_active);
        assert_eq!(user.date_joined, now);
        assert_eq!(user.last_login, Some(now));
        assert!(!is_usable_password(&user.password));
    }

    #[test]
    fn apply_profile_overwrites_identity_fields() {
        let joined = Utc::now() - Duration::days(30);
        let mut user = User::new("old-name", "!x", joined)
            .with_external_id("999")
            .with_avatar_url(Some("old".to_string()));
        let now = Utc::now();

        let mut latest = profile();
        latest.avatar_url = None;
        apply_profile(&mut user, &latest, now);

        assert_eq!(user.username, "nova");
        assert_eq!(user.email.as_deref(), Some("nova@example.com"));
        assert_eq!(user.avatar_url, None);
        assert_eq!(user.last_login, Some(now));
        assert_eq!(user.date_joined, joined);
    }

    #[test]
    fn build_claims_sets_window() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let claims =
            build_claims(user_id, TokenKind::Refresh, now, Duration::seconds(86400)).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn build_claims_rejects_unrepresentable_expiry() {
        let result = build_claims(Uuid::new_v4(), TokenKind::Access, Utc::now(), Duration::MAX);

        assert!(matches!(result, Err(AuthError::TokenIssue(_))));
    }
}
