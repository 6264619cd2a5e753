//! Session tokens: RS256-signed JWTs carrying identity and role claims.
//!
//! Key material is read once from the environment as base64-encoded PEM and
//! kept immutable for the life of the process.

mod claims;
mod issuer;
mod validator;

pub use claims::SessionClaims;
pub use issuer::{new_session_id, IssuedSession, TokenIssuer, DEFAULT_EXP_HOURS, MAX_EXP_HOURS};
pub use validator::{bearer_token, TokenValidator};

use base64::prelude::*;

use crate::errors::AppError;

/// Reads `var` and base64-decodes it into PEM bytes.
pub fn pem_from_env(var: &str) -> Result<Vec<u8>, AppError> {
    let encoded = std::env::var(var).map_err(|_| AppError::configuration(format!("{var} not set")))?;
    decode_pem(var, &encoded)
}

fn decode_pem(var: &str, encoded: &str) -> Result<Vec<u8>, AppError> {
    let pem = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|err| AppError::configuration(format!("{var} is not valid base64: {err}")))?;

    if pem.is_empty() {
        return Err(AppError::configuration(format!("{var} is empty")));
    }
    Ok(pem)
}
