//! Argon2id password hashing.

use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use rand::rngs::OsRng;

use crate::errors::{Error, Result};

// Argon2id tuned for interactive logins: 0.75 MiB, one pass, one lane.
const MEMORY_COST_KIB: u32 = 768;
const ITERATIONS: u32 = 1;
const PARALLELISM: u32 = 1;

pub fn password_hasher() -> Result<Argon2<'static>> {
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .map_err(|e| Error::internal(format!("Invalid Argon2 parameters: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password into a PHC string with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = password_hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a candidate against a stored PHC string.
///
/// Parameters are read from the stored hash, so hashes produced with older
/// settings keep verifying.
pub fn verify_password(candidate: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| Error::internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default().verify_password(candidate.as_bytes(), &parsed).is_ok())
}
