//! Password hashing.
//!
//! # Invariants
//! - Hashes are argon2id PHC strings with a fresh random salt.
//! - Verification never reveals why a password was rejected.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Password hashing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    Hash(String),
    MalformedHash(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(message) => write!(f, "password hashing failed: {message}"),
            Self::MalformedHash(message) => write!(f, "stored password hash is malformed: {message}"),
        }
    }
}

impl Error for AuthError {}

/// Hashes `password` into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| AuthError::Hash(err.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Hash(err.to_string()))?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash.
///
/// # Errors
/// - Returns `MalformedHash` when `stored_hash` cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| AuthError::MalformedHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
