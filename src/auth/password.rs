//! Password hashing primitive

use crate::error::{Error, Result};

/// Hash a plaintext password for storage.
///
/// # Errors
///
/// [`Error::Integrity`] if the hashing backend fails (effectively only on
/// resource exhaustion).
pub fn hash_password(plain: &str) -> Result<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::Integrity(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
///
/// Returns `false` for a well-formed hash that does not match.
///
/// # Errors
///
/// [`Error::Integrity`] if the stored hash is not a valid bcrypt string.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(plain, hash)
        .map_err(|e| Error::Integrity(format!("password verification failed: {e}")))
}
