//! Argon2id password hashing for local accounts.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use commune_core::auth::is_usable_password;
use rand::RngCore;

/// Hashes and verifies passwords as PHC strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, password_hash::Error> {
        let mut salt_bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut salt_bytes);

        let salt = SaltString::encode_b64(&salt_bytes)?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    }

    /// Returns true only when `stored` is a usable hash of `password`.
    ///
    /// Unusable markers and unparseable values never verify.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        if !is_usable_password(stored) {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(stored) else {
            tracing::warn!("Stored password is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commune_core::auth::generate_unusable_password;

    #[test]
    fn hash_then_verify() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("battery staple", &hash));
    }

    #[test]
    fn unusable_password_never_verifies() {
        let hasher = PasswordHasher::new();
        let marker = generate_unusable_password();

        assert!(!hasher.verify(&marker, &marker));
        assert!(!hasher.verify("", &marker));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!PasswordHasher::new().verify("secret", "plaintext"));
    }
}
