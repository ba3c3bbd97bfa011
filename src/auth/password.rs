//! Password Hashing
//! Mission: Turn plaintext into salted bcrypt hashes and check candidates against them

use crate::auth::models::PASSWORD_MAX_BYTES;
use anyhow::{bail, Context, Result};

/// Hash a plaintext password with a fresh random salt
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String> {
    if plaintext.len() > PASSWORD_MAX_BYTES {
        bail!("Password exceeds {} bytes", PASSWORD_MAX_BYTES);
    }
    bcrypt::hash(plaintext, cost).context("Failed to hash password")
}

/// Check a candidate against a stored hash.
///
/// Wrong passwords and malformed hashes both yield `false`.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    if plaintext.len() > PASSWORD_MAX_BYTES {
        return false;
    }
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}
