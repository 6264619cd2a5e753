use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::errors::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Deterministic password digest: SHA-256 over the password followed by the
/// server secret, hex encoded.
///
/// The digest is unsalted per record and fast to compute. It keeps the legacy
/// `digest(password + secret)` contract; a per-record salted slow hash would
/// need a re-hash-on-login migration.
#[derive(Clone)]
pub struct PasswordHasher {
    secret: Arc<Vec<u8>>,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher").field("secret", &"<redacted>").finish()
    }
}

impl PasswordHasher {
    pub fn new(secret: impl Into<String>) -> Result<Self, AppError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AppError::configuration("password hashing secret is empty"));
        }

        Ok(Self {
            secret: Arc::new(secret.into_bytes()),
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("PRIVATE_KEY")
            .map_err(|_| AppError::configuration("PRIVATE_KEY not set"))?;
        Self::new(secret)
    }

    pub fn hash(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(self.secret.as_slice());
        hex::encode(hasher.finalize())
    }

    pub fn verify(&self, password: &str, digest: &str) -> bool {
        constant_time_eq(self.hash(password).as_bytes(), digest.as_bytes())
    }
}

/// Byte comparison whose running time depends only on the input lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}
