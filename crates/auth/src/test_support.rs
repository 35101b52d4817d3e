//! Shared fixtures for the crate's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use commune_core::auth::{AuthError, ExternalProfile, IdentityProvider};
use commune_core::community::{user_conflict, User};
use commune_core::storage::{RepositoryError, Result, UserRepository};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{AuthConfig, DiscordConfig, TokenConfig};
use crate::tokens::TokenIssuer;
use crate::AuthState;

/// Minimal user store with the same uniqueness rules as the real backends.
#[derive(Default)]
pub struct MemoryUsers {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUsers {
    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(error) = user_conflict(users.values(), user) {
            return Err(error);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound {
                entity_type: "User",
                id: user.id.to_string(),
            });
        }
        if let Some(error) = user_conflict(users.values(), user) {
            return Err(error);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}

/// Identity provider returning a canned answer and counting calls.
#[derive(Clone)]
pub struct StubProvider {
    outcome: std::result::Result<ExternalProfile, AuthError>,
    calls: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn returning(profile: ExternalProfile) -> Self {
        Self {
            outcome: Ok(profile),
            calls: Arc::default(),
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            outcome: Err(error),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn exchange(&self, _code: &str) -> std::result::Result<ExternalProfile, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn test_config() -> AuthConfig {
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

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(&test_config().tokens)
}

pub fn auth_state(provider: StubProvider) -> AuthState {
    AuthState::with_provider(
        Arc::new(MemoryUsers::default()),
        Arc::new(provider),
        test_config(),
    )
}
