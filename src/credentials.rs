use chrono::{DateTime, Utc};

use crate::errors::{AppError, AppResult};
use crate::models::user::Identity;
use crate::store::AuthStore;
use crate::utils::PasswordHasher;

/// An identity whose password and active window have been checked.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub identity: Identity,
    pub roles: Vec<String>,
}

pub struct CredentialVerifier<'a> {
    store: &'a dyn AuthStore,
    hasher: &'a PasswordHasher,
}

impl<'a> CredentialVerifier<'a> {
    pub fn new(store: &'a dyn AuthStore, hasher: &'a PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Checks a login attempt at time `now`.
    ///
    /// Unknown login and wrong password both yield `InvalidCredentials`. The
    /// active window is only checked once the password matched.
    pub async fn verify(&self, login_id: &str, password: &str, now: DateTime<Utc>) -> AppResult<VerifiedIdentity> {
        let Some(identity) = self.store.find_identity_by_login(login_id).await? else {
            tracing::info!(login_id = %login_id, "login rejected: unknown login");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &identity.password_hash) {
            tracing::info!(user_id = %identity.id, "login rejected: password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        if !identity.is_active_at(now) {
            tracing::info!(user_id = %identity.id, "login rejected: outside active window");
            return Err(AppError::AccountInactive);
        }

        let roles = self.store.role_names_for_user(identity.id).await?;

        Ok(VerifiedIdentity { identity, roles })
    }
}
