use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

use super::errors::AuthError;

/// Hash a password with Argon2id and a fresh random salt.
///
/// The result is a self-describing PHC string (`$argon2id$v=19$...`) carrying
/// the salt and cost parameters, so it can be verified without extra state.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AuthError::Hashing
        })?
        .to_string();
    Ok(hash)
}

/// Check `plain` against a stored PHC hash in constant time.
///
/// A mismatch is `Ok(false)`; only a hash that cannot be parsed is an error.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AuthError::Hashing
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

lazy_static! {
    /// Hash of a random throwaway password, verified against when no real hash exists.
    static ref DUMMY_HASH: Option<String> = {
        let throwaway = SaltString::generate(&mut OsRng);
        hash_password(throwaway.as_str()).ok()
    };
}

/// Spend the same Argon2 work as a real verification, always failing.
///
/// Used on login paths with no stored hash so their response time matches a
/// wrong-password attempt.
pub fn verify_dummy(plain: &str) -> bool {
    match DUMMY_HASH.as_deref() {
        Some(hash) => {
            let _ = verify_password(plain, hash);
        }
        None => {
            let _ = hash_password(plain);
        }
    }
    false
}
