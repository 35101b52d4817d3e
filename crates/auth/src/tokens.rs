//! Signed session tokens.
//!
//! Access and refresh tokens are HS256 JWTs sharing one secret. Nothing is
//! stored server side, so a token stays valid until it expires.

use chrono::{Duration, Utc};
use commune_core::auth::{build_claims, AuthError, TokenClaims, TokenKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::config::TokenConfig;

/// Issues and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            access_ttl: to_chrono(config.access_ttl),
            refresh_ttl: to_chrono(config.refresh_ttl),
        }
    }

    /// Mint a token of the given kind for a user.
    pub fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        self.encode(&build_claims(user_id, kind, Utc::now(), ttl)?)
    }

    /// Mint an access and a refresh token for a user.
    pub fn issue_pair(&self, user_id: Uuid) -> Result<(String, String), AuthError> {
        Ok((
            self.issue(user_id, TokenKind::Access)?,
            self.issue(user_id, TokenKind::Refresh)?,
        ))
    }

    /// Verify signature, expiry and token kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AuthError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Unauthenticated(e.to_string()))?;

        if claims.token_type != expected {
            return Err(AuthError::Unauthenticated(format!(
                "expected {expected} token, got {}",
                claims.token_type
            )));
        }
        Ok(claims)
    }

    fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }
}

fn to_chrono(ttl: std::time::Duration) -> Duration {
    Duration::from_std(ttl).unwrap_or(Duration::MAX)
}
