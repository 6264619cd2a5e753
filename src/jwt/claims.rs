use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a session token. Field names are a wire contract shared with
/// other consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub login_id: String,
    pub user_id: Uuid,
    /// Holds the personal phone number, not a user name.
    pub username: String,
    pub email: String,
    pub session_id: Uuid,
    /// Expiry, Unix seconds.
    pub exp: i64,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    pub roles: Vec<String>,
}
