use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::store::AuthStore;

use super::claims::SessionClaims;

pub const DEFAULT_EXP_HOURS: i64 = 24;
/// One year.
pub const MAX_EXP_HOURS: i64 = 24 * 365;

/// A freshly signed token and the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Signs session tokens with the RSA private key.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").field("lifetime", &self.lifetime).finish()
    }
}

impl TokenIssuer {
    pub fn from_pem(pem: &[u8], exp_hours: i64) -> Result<Self, AppError> {
        if !(1..=MAX_EXP_HOURS).contains(&exp_hours) {
            return Err(AppError::configuration(format!(
                "JWT_EXP_HOURS must be between 1 and {MAX_EXP_HOURS}"
            )));
        }
        let lifetime = Duration::try_hours(exp_hours)
            .ok_or_else(|| AppError::configuration("JWT_EXP_HOURS is out of range"))?;

        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|err| AppError::configuration(format!("invalid JWT private key: {err}")))?;

        Ok(Self { key, lifetime })
    }

    pub fn from_env() -> Result<Self, AppError> {
        let pem = super::pem_from_env("JWT_PRIVATE_KEY")?;
        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(DEFAULT_EXP_HOURS))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Self::from_pem(&pem, exp_hours)
    }

    pub fn exp_hours(&self) -> i64 {
        self.lifetime.num_hours()
    }

    /// Loads the user's roles and signs a new session token.
    ///
    /// A user without any role assignment cannot receive a token. Nothing is
    /// written to the store.
    pub async fn issue(&self, store: &dyn AuthStore, user_id: Uuid, now: DateTime<Utc>) -> AppResult<IssuedSession> {
        let identity = store
            .find_identity(user_id)
            .await?
            .ok_or(AppError::UserOrRolesNotFound)?;

        let roles = store.role_names_for_user(user_id).await?;
        if roles.is_empty() {
            tracing::warn!(user_id = %user_id, "token refused: user holds no roles");
            return Err(AppError::UserOrRolesNotFound);
        }

        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AppError::internal("token expiry out of range"))?;

        let claims = SessionClaims {
            login_id: identity.login_id,
            user_id: identity.id,
            username: identity.phone_number_personal.unwrap_or_default(),
            email: identity.email_work,
            session_id: new_session_id()?,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            roles,
        };

        let token = self.sign(&claims)?;

        tracing::debug!(
            user_id = %claims.user_id,
            session_id = %claims.session_id,
            roles = ?claims.roles,
            "session token issued"
        );

        Ok(IssuedSession { token, claims })
    }

    pub fn sign(&self, claims: &SessionClaims) -> AppResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &self.key)
            .map_err(|err| AppError::internal(format!("failed to sign token: {err}")))
    }
}

/// 16 bytes from the OS RNG shaped into a version-4 UUID (version nibble and
/// variant bits forced).
pub fn new_session_id() -> AppResult<Uuid> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AppError::internal(format!("failed to generate session id: {err}")))?;

    Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
}
