use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::AuthError;

pub const DEFAULT_DISCORD_API_ENDPOINT: &str = "https://discord.com/api/v10";
pub const DEFAULT_DISCORD_CDN_ENDPOINT: &str = "https://cdn.discordapp.com";

/// Discord OAuth application settings.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Base of the REST API, without a trailing slash.
    pub api_endpoint: String,
    /// Base of the avatar CDN, without a trailing slash.
    pub cdn_endpoint: String,
    pub http_timeout: Duration,
}

/// JWT signing settings.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub discord: DiscordConfig,
    pub tokens: TokenConfig,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DISCORD_CLIENT_ID`, `DISCORD_CLIENT_SECRET`, `DISCORD_REDIRECT_URI`: OAuth application (required)
    /// - `DISCORD_API_ENDPOINT`: REST API base (default: `https://discord.com/api/v10`)
    /// - `DISCORD_CDN_ENDPOINT`: avatar CDN base (default: `https://cdn.discordapp.com`)
    /// - `DISCORD_HTTP_TIMEOUT_SECS`: timeout for each provider call (default: 10)
    /// - `JWT_SECRET`: HS256 signing secret (required)
    /// - `ACCESS_TOKEN_TTL_SECS`: access token lifetime (default: 300)
    /// - `REFRESH_TOKEN_TTL_SECS`: refresh token lifetime (default: 86400)
    ///
    /// Token lifetimes must be between 1 second and `MAX_TOKEN_TTL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AuthError> {
        let discord = DiscordConfig {
            client_id: required("DISCORD_CLIENT_ID")?,
            client_secret: required("DISCORD_CLIENT_SECRET")?,
            redirect_uri: required("DISCORD_REDIRECT_URI")?,
            api_endpoint: endpoint("DISCORD_API_ENDPOINT", DEFAULT_DISCORD_API_ENDPOINT)?,
            cdn_endpoint: endpoint("DISCORD_CDN_ENDPOINT", DEFAULT_DISCORD_CDN_ENDPOINT)?,
            http_timeout: Duration::from_secs(parse_or("DISCORD_HTTP_TIMEOUT_SECS", 10)?),
        };

        let tokens = TokenConfig {
            secret: required("JWT_SECRET")?,
            access_ttl: token_ttl("ACCESS_TOKEN_TTL_SECS", parse_or("ACCESS_TOKEN_TTL_SECS", 300)?)?,
            refresh_ttl: token_ttl(
                "REFRESH_TOKEN_TTL_SECS",
                parse_or("REFRESH_TOKEN_TTL_SECS", 86_400)?,
            )?,
        };

        Ok(Self { discord, tokens })
    }
}

fn required(name: &str) -> Result<String, AuthError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AuthError::Config(format!("{name} must be set")))
}

fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, AuthError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| AuthError::Config(format!("{name} has an invalid value: {value}"))),
        Err(_) => Ok(default),
    }
}

/// Upper bound for token lifetimes (ten years).
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn token_ttl(name: &str, secs: u64) -> Result<Duration, AuthError> {
    if secs == 0 || secs > MAX_TOKEN_TTL_SECS {
        return Err(AuthError::Config(format!(
            "{name} must be between 1 and {MAX_TOKEN_TTL_SECS} seconds, got {secs}"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn endpoint(name: &str, default: &str) -> Result<String, AuthError> {
    let value = std::env::var(name).unwrap_or_else(|_| default.to_string());
    normalize_endpoint(&value).map_err(|e| AuthError::Config(format!("{name}: {e}")))
}

/// Validates an endpoint URL and strips the trailing slash.
pub(crate) fn normalize_endpoint(value: &str) -> Result<String, url::ParseError> {
    Url::parse(value)?;
    Ok(value.trim_end_matches('/').to_string())
}
