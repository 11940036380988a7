//! # hs-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! New passwords are stored as PHC strings; rows that predate hashing hold the
//! password itself and are still accepted.

use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use hs_core::traits::AuthProvider;
use tracing::debug;

#[derive(Default)]
pub struct SimpleAuthProvider {
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// Hashes with a fresh 16-byte salt from the OS.
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let mut salt = [0u8; 16];
        getrandom::getrandom(&mut salt).map_err(|e| anyhow!("salt generation failed: {e}"))?;
        let salt = SaltString::encode_b64(&salt).map_err(|e| anyhow!("salt encoding failed: {e}"))?;

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies against a stored Argon2 hash, or compares directly when the
    /// stored value is not a PHC string.
    async fn verify_password(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => {
                debug!("stored password is not a hash, comparing as plain text");
                password == stored
            }
        }
    }
}
