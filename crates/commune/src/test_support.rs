//! Shared fixtures for the binary's router tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;

use commune_auth::{AuthConfig, AuthState, DiscordConfig, TokenConfig};
use commune_core::auth::{AuthError, ExternalProfile, IdentityProvider, TokenKind};
use commune_core::community::User;
use commune_core::storage::UserRepository;

use crate::config::Config;
use crate::state::AppState;
use crate::storage::InMemoryRepository;
use crate::tunnel::TunnelStatus;

/// Provider that never answers; the community routes do not use it.
struct UnreachableProvider;

#[async_trait]
impl IdentityProvider for UnreachableProvider {
    async fn exchange(&self, _code: &str) -> Result<ExternalProfile, AuthError> {
        Err(AuthError::TokenExchangeFailed {
            details: serde_json::json!({}),
        })
    }

    fn name(&self) -> &'static str {
        "unreachable"
    }
}

fn auth_config() -> AuthConfig {
    AuthConfig {
        discord: DiscordConfig {
            client_id: "client-1".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            api_endpoint: "http://127.0.0.1:9".to_string(),
            cdn_endpoint: "https://cdn.discordapp.com".to_string(),
            http_timeout: Duration::from_secs(1),
        },
        tokens: TokenConfig {
            secret: "test-secret".to_string(),
            access_ttl: Duration::from_secs(300),
            refresh_ttl: Duration::from_secs(86_400),
        },
    }
}

/// State over an empty in-memory store with the default `/api` prefix.
pub fn test_state() -> AppState {
    test_state_with(Config::default())
}

pub fn test_state_with(config: Config) -> AppState {
    let repo = Arc::new(InMemoryRepository::new());
    let auth = AuthState::with_provider(
        repo.clone(),
        Arc::new(UnreachableProvider),
        auth_config(),
    );
    AppState::new(repo, auth, &config, TunnelStatus::default())
}

/// Creates an active user and returns it with a fresh access token.
pub async fn signed_in_user(state: &AppState, username: &str) -> (User, String) {
    let user = User::new(username, "!unusable", chrono::Utc::now());
    state.auth.users.create_user(&user).await.unwrap();
    let token = state.auth.tokens.issue(user.id, TokenKind::Access).unwrap();
    (user, token)
}

pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
