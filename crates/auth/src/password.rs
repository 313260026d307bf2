//! Password hashing.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`),
//! so parameters travel with each hash. Both operations are CPU-bound; async
//! callers go through the `*_blocking` variants, which run on tokio's blocking
//! pool.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

const SALT_BYTES: usize = 16;

/// Hashing could not produce a PHC string (or its worker task died).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| PasswordHashError(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Check a password against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// `hash_password` on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordHashError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordHashError(e.to_string()))?
}

/// `verify_password` on the blocking pool. A failed worker counts as a mismatch.
pub async fn verify_password_blocking(password: String, stored: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("longpass1").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("longpass1", &stored));
        assert!(!verify_password("longpass2", &stored));
    }

    #[test]
    fn salts_differ_per_hash() {
        assert_ne!(
            hash_password("longpass1").unwrap(),
            hash_password("longpass1").unwrap()
        );
    }

    #[test]
    fn malformed_hashes_never_verify() {
        for bad in ["", "plain", "sha256$1$00$00", "$argon2id$", "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"] {
            assert!(!verify_password("anything", bad), "verified against {bad:?}");
        }
    }

    #[tokio::test]
    async fn blocking_variants_agree_with_sync_ones() {
        let stored = hash_password_blocking("longpass1".into()).await.unwrap();
        assert!(verify_password_blocking("longpass1".into(), stored.clone()).await);
        assert!(!verify_password_blocking("wrongpass".into(), stored).await);
    }
}
