use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::authz::Principal;
use crate::errors::{AppError, AppResult};

/// Verifies session tokens against the RSA public key.
///
/// The accepted algorithm list is pinned to RS256, so a token whose header
/// names any other algorithm (HS256 signed with the public key, `none`, ...)
/// is rejected before its signature is looked at.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenValidator {
    pub fn from_pem(pem: &[u8]) -> Result<Self, AppError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|err| AppError::configuration(format!("invalid JWT public key: {err}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 5;

        Ok(Self { key, validation })
    }

    pub fn from_env() -> Result<Self, AppError> {
        let pem = super::pem_from_env("JWT_PUBLIC_KEY")?;
        Self::from_pem(&pem)
    }

    /// Checks signature and expiry and returns the raw claim map. Claim
    /// shapes are checked separately so that an incomplete claim set can be
    /// told apart from a bad token.
    pub fn decode(&self, token: &str) -> AppResult<Map<String, Value>> {
        jsonwebtoken::decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AppError::unauthenticated("token has expired"),
                ErrorKind::InvalidSignature => AppError::unauthenticated("invalid token signature"),
                ErrorKind::InvalidAlgorithm => AppError::unauthenticated("unexpected signing method"),
                _ => AppError::unauthenticated("invalid token"),
            })
    }

    /// Bearer header → verified token → principal, without a role check.
    pub fn authenticate(&self, authorization: Option<&str>) -> AppResult<Principal> {
        let token = bearer_token(authorization)?;
        let claims = self.decode(token)?;
        Principal::from_claims(&claims)
    }

    /// Authenticates and then requires at least one role from `allow_list`.
    pub fn validate<S: AsRef<str>>(&self, authorization: Option<&str>, allow_list: &[S]) -> AppResult<Principal> {
        let principal = self.authenticate(authorization)?;

        if !principal.has_any_role(allow_list) {
            tracing::debug!(
                user_id = %principal.user_id,
                roles = ?principal.roles,
                "access denied: no allowed role"
            );
            return Err(AppError::forbidden("access denied"));
        }

        Ok(principal)
    }
}

/// Extracts `<token>` from a `Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> AppResult<&str> {
    let value = authorization.ok_or_else(|| AppError::unauthenticated("authorization header missing"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() && !token.contains(' ') => Ok(token.trim()),
        _ => Err(AppError::unauthenticated("malformed authorization header")),
    }
}
