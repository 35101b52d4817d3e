use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::community::PublicProfile;

/// Identity returned by an external provider after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    /// The provider's stable user id.
    pub external_id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Which of the two session tokens a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: Uuid,
    pub token_type: TokenKind,
    /// Random token id.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: PublicProfile,
    #[serde(rename = "access")]
    pub access_token: String,
    #[serde(rename = "refresh")]
    pub refresh_token: String,
}
