//! Argon2id hashing for per-file passwords.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::application::error::ApplicationError;

/// Hashes a file password into a PHC-formatted Argon2id string.
pub fn hash(password: &str) -> Result<String, ApplicationError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApplicationError::InternalError(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored hash. A malformed hash counts as a
/// mismatch.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_produces_argon2id_phc_string() {
        let hashed = hash("secret").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_accepts_matching_password_only() {
        let hashed = hash("secret").unwrap();
        assert!(verify("secret", &hashed));
        assert!(!verify("wrong", &hashed));
    }

    #[test]
    fn verify_rejects_malformed_hashes() {
        assert!(!verify("secret", "not-a-hash"));
        assert!(!verify("secret", ""));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash("secret").unwrap();
        let b = hash("secret").unwrap();
        assert_ne!(a, b);
    }
}
