use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Stored identity row, including the password digest. Never serialized.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub login_id: String,
    pub email_work: String,
    pub email_personal: Option<String>,
    pub phone_number_work: Option<String>,
    pub phone_number_personal: Option<String>,
    pub is_active: Option<bool>,
    pub active_start_date: DateTime<Utc>,
    pub active_end_date: Option<DateTime<Utc>>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// `now` must fall inside `[active_start_date, active_end_date]`; an absent
    /// end date leaves the window open.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if now < self.active_start_date {
            return false;
        }
        match self.active_end_date {
            Some(end) => now <= end,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub login_id: String,
    pub email_work: String,
    pub email_personal: Option<String>,
    pub phone_number_work: Option<String>,
    pub phone_number_personal: Option<String>,
    pub is_active: Option<bool>,
    pub active_start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_end_date: Option<DateTime<Utc>>,
}

impl From<&Identity> for UserProfile {
    fn from(value: &Identity) -> Self {
        UserProfile {
            id: value.id,
            first_name: value.first_name.clone(),
            last_name: value.last_name.clone(),
            login_id: value.login_id.clone(),
            email_work: value.email_work.clone(),
            email_personal: value.email_personal.clone(),
            phone_number_work: value.phone_number_work.clone(),
            phone_number_personal: value.phone_number_personal.clone(),
            is_active: value.is_active,
            active_start_date: value.active_start_date,
            active_end_date: value.active_end_date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "bat.erdene")]
    pub login_id: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

/// Login result: the profile flattened next to the session data.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub roles: Vec<String>,
    pub session_id: Uuid,
    /// Unix seconds.
    pub expires_at: i64,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Bat")]
    pub first_name: String,
    #[schema(example = "Erdene")]
    pub last_name: String,
    #[schema(example = "bat.erdene")]
    pub login_id: String,
    #[schema(example = "bat@company.mn")]
    pub email_work: String,
    pub email_personal: Option<String>,
    pub phone_number_work: Option<String>,
    #[schema(example = "99112233")]
    pub phone_number_personal: Option<String>,
    pub is_active: Option<bool>,
    /// Defaults to the creation time.
    pub active_start_date: Option<DateTime<Utc>>,
    pub active_end_date: Option<DateTime<Utc>>,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

impl CreateUserRequest {
    /// Checks the request and turns it into a storable identity. The caller
    /// supplies the password digest.
    pub fn into_identity(self, password_hash: String, now: DateTime<Utc>) -> Result<Identity, AppError> {
        let login_id = self.login_id.trim().to_string();
        if login_id.is_empty() {
            return Err(AppError::bad_request("login_id must not be empty"));
        }

        let email_work = self.email_work.trim().to_string();
        if email_work.is_empty() {
            return Err(AppError::bad_request("email_work must not be empty"));
        }

        let active_start_date = self.active_start_date.unwrap_or(now);
        if let Some(end) = self.active_end_date {
            if end < active_start_date {
                return Err(AppError::bad_request("active_end_date must not precede active_start_date"));
            }
        }

        Ok(Identity {
            id: Uuid::new_v4(),
            first_name: self.first_name,
            last_name: self.last_name,
            login_id,
            email_work,
            email_personal: self.email_personal,
            phone_number_work: self.phone_number_work,
            phone_number_personal: self.phone_number_personal,
            is_active: Some(self.is_active.unwrap_or(true)),
            active_start_date,
            active_end_date: self.active_end_date,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }
}
