//! Discord OAuth2 identity provider.

use async_trait::async_trait;
use commune_core::auth::{
    avatar_url, require_code, AuthError, ExternalProfile, IdentityProvider, Result,
};
use serde::Deserialize;
use serde_json::Value;

use crate::config::DiscordConfig;

/// Profile fields read from `GET /users/@me`.
#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

/// Discord provider: one token exchange, one profile fetch, no retries.
pub struct DiscordProvider {
    config: DiscordConfig,
    http_client: reqwest::Client,
}

impl DiscordProvider {
    /// Create a new Discord provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: DiscordConfig) -> std::result::Result<Self, crate::AuthError> {
        // Build HTTP client without redirect following
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| crate::AuthError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String> {
        let token_url = format!("{}/oauth2/token", self.config.api_endpoint);
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Discord token request failed");
                AuthError::TokenExchangeFailed {
                    details: Value::String(e.to_string()),
                }
            })?;

        let status = response.status();
        let payload = read_payload(response).await;

        if !status.is_success() {
            tracing::warn!(status = %status, "Discord rejected authorization code");
            return Err(AuthError::TokenExchangeFailed { details: payload });
        }

        match payload.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => {
                tracing::warn!("Discord token response has no access_token");
                Err(AuthError::TokenExchangeFailed { details: payload })
            }
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<DiscordUser> {
        let profile_url = format!("{}/users/@me", self.config.api_endpoint);

        let response = self
            .http_client
            .get(&profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Discord profile request failed");
                AuthError::ProfileFetchFailed {
                    details: Value::String(e.to_string()),
                }
            })?;

        let status = response.status();
        let payload = read_payload(response).await;

        if !status.is_success() {
            tracing::warn!(status = %status, "Discord profile fetch rejected");
            return Err(AuthError::ProfileFetchFailed { details: payload });
        }

        serde_json::from_value(payload.clone()).map_err(|e| {
            tracing::warn!(error = %e, "Discord profile has unexpected shape");
            AuthError::ProfileFetchFailed { details: payload }
        })
    }
}

#[async_trait]
impl IdentityProvider for DiscordProvider {
    async fn exchange(&self, code: &str) -> Result<ExternalProfile> {
        let code = require_code(Some(code))?;

        let access_token = self.fetch_access_token(code).await?;
        let user = self.fetch_profile(&access_token).await?;

        tracing::debug!(external_id = %user.id, "Fetched Discord profile");

        Ok(ExternalProfile {
            avatar_url: avatar_url(&self.config.cdn_endpoint, &user.id, user.avatar.as_deref()),
            external_id: user.id,
            username: user.username,
            email: user.email,
        })
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

/// Response body as JSON, or the raw text wrapped in a JSON string.
async fn read_payload(response: reqwest::Response) -> Value {
    match response.text().await {
        Ok(text) => payload_from_body(text),
        Err(e) => Value::String(e.to_string()),
    }
}

fn payload_from_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap},
        routing::{get, post},
        Form, Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Stand-in for the Discord API that counts calls per endpoint.
    #[derive(Clone)]
    struct MockDiscord {
        token_calls: Arc<AtomicUsize>,
        profile_calls: Arc<AtomicUsize>,
        token_status: axum::http::StatusCode,
        token_body: Value,
        profile_status: axum::http::StatusCode,
        profile_body: Value,
    }

    impl MockDiscord {
        fn succeeding() -> Self {
            Self {
                token_calls: Arc::default(),
                profile_calls: Arc::default(),
                token_status: axum::http::StatusCode::OK,
                token_body: json!({"access_token": "tok", "token_type": "Bearer"}),
                profile_status: axum::http::StatusCode::OK,
                profile_body: json!({
                    "id": "999",
                    "username": "nova",
                    "email": null,
                    "avatar": "h4sh"
                }),
            }
        }

        async fn start(self) -> (String, Self) {
            let app = Router::new()
                .route("/oauth2/token", post(token))
                .route("/users/@me", get(profile))
                .with_state(self.clone());

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            (format!("http://{addr}"), self)
        }

        fn token_calls(&self) -> usize {
            self.token_calls.load(Ordering::SeqCst)
        }

        fn profile_calls(&self) -> usize {
            self.profile_calls.load(Ordering::SeqCst)
        }
    }

    async fn token(
        State(mock): State<MockDiscord>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (axum::http::StatusCode, Json<Value>) {
        mock.token_calls.fetch_add(1, Ordering::SeqCst);
        if form.get("code").map(String::as_str) != Some("abc123")
            || form.get("grant_type").map(String::as_str) != Some("authorization_code")
            || form.get("client_id").map(String::as_str) != Some("client-1")
        {
            return (
                axum::http::StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_grant"})),
            );
        }
        (mock.token_status, Json(mock.token_body.clone()))
    }

    async fn profile(
        State(mock): State<MockDiscord>,
        headers: HeaderMap,
    ) -> (axum::http::StatusCode, Json<Value>) {
        mock.profile_calls.fetch_add(1, Ordering::SeqCst);
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer tok");
        if !authorized {
            return (
                axum::http::StatusCode::UNAUTHORIZED,
                Json(json!({"message": "401: Unauthorized"})),
            );
        }
        (mock.profile_status, Json(mock.profile_body.clone()))
    }

    fn provider(api_endpoint: String) -> DiscordProvider {
        DiscordProvider::new(DiscordConfig {
            client_id: "client-1".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            api_endpoint,
            cdn_endpoint: "https://cdn.example".to_string(),
            http_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn exchange_returns_profile_with_avatar() {
        let (base, mock) = MockDiscord::succeeding().start().await;

        let profile = provider(base).exchange("abc123").await.unwrap();

        assert_eq!(profile.external_id, "999");
        assert_eq!(profile.username, "nova");
        assert_eq!(profile.email, None);
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://cdn.example/avatars/999/h4sh.png")
        );
        assert_eq!(mock.token_calls(), 1);
        assert_eq!(mock.profile_calls(), 1);
    }

    #[tokio::test]
    async fn empty_code_makes_no_outbound_call() {
        let (base, mock) = MockDiscord::succeeding().start().await;

        let result = provider(base).exchange("").await;

        assert_eq!(result, Err(AuthError::MissingCode));
        assert_eq!(mock.token_calls(), 0);
        assert_eq!(mock.profile_calls(), 0);
    }

    #[tokio::test]
    async fn token_failure_skips_profile_endpoint() {
        let (base, mock) = MockDiscord::succeeding().start().await;

        let result = provider(base).exchange("wrong-code").await;

        assert_eq!(
            result,
            Err(AuthError::TokenExchangeFailed {
                details: json!({"error": "invalid_grant"})
            })
        );
        assert_eq!(mock.token_calls(), 1);
        assert_eq!(mock.profile_calls(), 0);
    }

    #[tokio::test]
    async fn missing_access_token_is_exchange_failure() {
        let mut mock = MockDiscord::succeeding();
        mock.token_body = json!({"token_type": "Bearer"});
        let (base, mock) = mock.start().await;

        let result = provider(base).exchange("abc123").await;

        assert!(matches!(result, Err(AuthError::TokenExchangeFailed { .. })));
        assert_eq!(mock.profile_calls(), 0);
    }

    #[tokio::test]
    async fn profile_failure_carries_payload() {
        let mut mock = MockDiscord::succeeding();
        mock.profile_status = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
        mock.profile_body = json!({"message": "upstream down"});
        let (base, _mock) = mock.start().await;

        let result = provider(base).exchange("abc123").await;

        assert_eq!(
            result,
            Err(AuthError::ProfileFetchFailed {
                details: json!({"message": "upstream down"})
            })
        );
    }

    #[tokio::test]
    async fn null_avatar_yields_no_url() {
        let mut mock = MockDiscord::succeeding();
        mock.profile_body = json!({"id": "999", "username": "nova", "avatar": null});
        let (base, _mock) = mock.start().await;

        let profile = provider(base).exchange("abc123").await.unwrap();

        assert_eq!(profile.avatar_url, None);
    }

    #[tokio::test]
    async fn unreachable_provider_is_exchange_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = provider(format!("http://{addr}")).exchange("abc123").await;

        assert!(matches!(
            result,
            Err(AuthError::TokenExchangeFailed {
                details: Value::String(_)
            })
        ));
    }

    #[test]
    fn non_json_body_is_wrapped_as_string() {
        assert_eq!(
            payload_from_body("Bad Gateway".to_string()),
            Value::String("Bad Gateway".to_string())
        );
        assert_eq!(
            payload_from_body(r#"{"error":"x"}"#.to_string()),
            json!({"error": "x"})
        );
    }
}
