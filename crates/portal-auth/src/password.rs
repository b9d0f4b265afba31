//! Password hashing

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::AuthError;

/// Hash a password with Argon2id and a random salt, returning a PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a PHC hash string.
///
/// The comparison itself is constant-time. A malformed hash is an error,
/// a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHash(e.to_string())),
    }
}

/// Hashing capability used by the authenticator
pub trait SecretHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, AuthError>;

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Argon2id with the crate's default parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl SecretHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, AuthError> {
        hash_password(plain)
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
        verify_password(plain, hash)
    }
}
