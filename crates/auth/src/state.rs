//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;
use commune_core::auth::IdentityProvider;
use commune_core::storage::UserRepository;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::PasswordHasher;
use crate::providers::DiscordProvider;
use crate::tokens::TokenIssuer;

/// Shared state for auth handlers and extractors.
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserRepository>,
    pub provider: Arc<dyn IdentityProvider>,
    pub tokens: TokenIssuer,
    pub passwords: PasswordHasher,
    pub config: AuthConfig,
}

impl AuthState {
    /// Creates an AuthState backed by the Discord provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's HTTP client cannot be built.
    pub fn new(users: Arc<dyn UserRepository>, config: AuthConfig) -> Result<Self, AuthError> {
        let provider = Arc::new(DiscordProvider::new(config.discord.clone())?);
        Ok(Self::with_provider(users, provider, config))
    }

    /// Creates an AuthState with an explicit identity provider.
    pub fn with_provider(
        users: Arc<dyn UserRepository>,
        provider: Arc<dyn IdentityProvider>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            provider,
            tokens: TokenIssuer::new(&config.tokens),
            passwords: PasswordHasher::new(),
            config,
        }
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
