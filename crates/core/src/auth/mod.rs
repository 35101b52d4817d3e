mod error;
mod functions;
mod traits;
mod types;

pub use error::AuthError;
pub use functions::{
    apply_profile, avatar_url, build_claims, generate_token_id, generate_unusable_password,
    is_usable_password, require_code, user_from_profile, UNUSABLE_PASSWORD_PREFIX,
};
pub use traits::{IdentityProvider, Result};
pub use types::{ExternalProfile, Session, TokenClaims, TokenKind};
