use async_trait::async_trait;

use super::{AuthError, ExternalProfile};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// An OAuth identity provider that turns an authorization code into a
/// profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange the code for a provider token, then fetch the profile with it.
    ///
    /// The provider token is dropped once the profile is read.
    async fn exchange(&self, code: &str) -> Result<ExternalProfile>;

    /// Short provider name used in logs.
    fn name(&self) -> &'static str;
}
