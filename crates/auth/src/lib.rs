//! Authentication for commune.
//!
//! This crate provides:
//! - Discord OAuth2 code exchange and account reconciliation
//! - Stateless HS256 access and refresh tokens
//! - Argon2id password hashing for local accounts
//! - Axum routes and extractors for authentication

mod config;
mod error;
mod extractors;
mod handlers;
mod password;
mod providers;
mod reconcile;
mod state;
#[cfg(test)]
mod test_support;
mod tokens;

pub use config::{AuthConfig, DiscordConfig, TokenConfig};
pub use error::{AuthError, ErrorBody};
pub use extractors::CurrentUser;
pub use handlers::auth_routes;
pub use password::PasswordHasher;
pub use providers::DiscordProvider;
pub use reconcile::{issue_session, reconcile};
pub use state::AuthState;
pub use tokens::TokenIssuer;
