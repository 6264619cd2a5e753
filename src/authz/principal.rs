use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Identity carried by a verified session token. Inserted into the request
/// extensions by the access middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl Principal {
    /// Builds a principal from verified claims. A missing or mistyped claim
    /// is `Forbidden`: the token itself was valid.
    pub fn from_claims(claims: &Map<String, Value>) -> AppResult<Self> {
        let user_id = required_uuid(claims, "user_id")?;
        let session_id = required_uuid(claims, "session_id")?;
        let email = required_str(claims, "email")?.to_string();

        // non-string entries are skipped
        let roles = claims
            .get("roles")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::forbidden("roles not found in token"))?
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();

        Ok(Self {
            user_id,
            session_id,
            email,
            roles,
        })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// True when the principal's roles intersect `allow_list`.
    pub fn has_any_role<S: AsRef<str>>(&self, allow_list: &[S]) -> bool {
        allow_list.iter().any(|allowed| self.has_role(allowed.as_ref()))
    }
}

fn required_str<'a>(claims: &'a Map<String, Value>, key: &str) -> AppResult<&'a str> {
    claims
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::forbidden(format!("{key} not found in token")))
}

fn required_uuid(claims: &Map<String, Value>, key: &str) -> AppResult<Uuid> {
    let raw = required_str(claims, key)?;
    Uuid::parse_str(raw).map_err(|_| AppError::forbidden(format!("{key} in token is not a valid id")))
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::unauthenticated("no verified session on request"))
    }
}
