//! Password hashing (Argon2id, PHC string format).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// One-way password hashing with constant-time verification.
///
/// Both operations are CPU-bound; async callers should run them on a blocking
/// thread.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// `false` for a wrong password and for an unparseable stored hash alike.
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// A valid hash of a throwaway secret, verified against when the account
    /// does not exist so both login failure paths cost the same.
    fn dummy_hash(&self) -> &str;
}

pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
    dummy: String,
}

impl Argon2PasswordHasher {
    pub fn new() -> Result<Self, PasswordError> {
        let argon2 = Argon2::default();
        let dummy = hash_with(&argon2, "backoffice-dummy-password")?;
        Ok(Self { argon2, dummy })
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    use argon2::PasswordHasher as _;

    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError(e.to_string()))?;
    Ok(hash.to_string())
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, password)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn dummy_hash(&self) -> &str {
        &self.dummy
    }
}
