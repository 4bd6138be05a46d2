use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};

use crate::error::EtudeError;

/// Hash a plaintext password using Argon2.
pub fn hash_password(password: &str) -> Result<String, EtudeError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| EtudeError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, EtudeError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| EtudeError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Verify a plaintext password and, when the stored hash uses an outdated
/// algorithm or cost parameters, return a replacement hash minted with the
/// current scheme.
///
/// Returns `(is_valid, updated_hash)`. The caller persists the updated hash;
/// the password itself never changes.
pub fn verify_and_update(
    password: &str,
    hash: &str,
) -> Result<(bool, Option<String>), EtudeError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| EtudeError::Internal(format!("Invalid password hash: {}", e)))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok((false, None));
    }

    let outdated = parsed_hash.algorithm.as_str() != "argon2id"
        || Params::try_from(&parsed_hash)
            .map(|params| params != Params::default())
            .unwrap_or(true);

    if outdated {
        let new_hash = hash_password(password)?;
        return Ok((true, Some(new_hash)));
    }

    Ok((true, None))
}
