use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserProfile;

// =============================================================================
// ROLE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: &str, now: DateTime<Utc>) -> Result<Self, AppError> {
        Ok(Role {
            id: Uuid::new_v4(),
            name: Self::normalize_name(name)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Role names are stored trimmed and upper-cased.
    pub fn normalize_name(name: &str) -> Result<String, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("role name must not be empty"));
        }
        Ok(name.to_uppercase())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleCreateRequest {
    #[schema(example = "manager")]
    pub name: String,
}

// =============================================================================
// ACTION TYPE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionType {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionTypeCreateRequest {
    #[schema(example = "evaluation.submit")]
    pub name: String,
    #[schema(example = "Submit a 360 evaluation")]
    pub description: Option<String>,
}

// =============================================================================
// JOIN ROWS (grants and assignments)
// =============================================================================

/// The two join tables handled by the reconciler. Row existence is the
/// boolean; absence is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Role (holder) may perform an action type (target).
    RolePermission,
    /// User (holder) holds a role (target).
    UserRole,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::RolePermission => "role_permission",
            Relation::UserRole => "user_role",
        }
    }

    pub fn holder_kind(&self) -> &'static str {
        match self {
            Relation::RolePermission => "role",
            Relation::UserRole => "user",
        }
    }

    pub fn target_kind(&self) -> &'static str {
        match self {
            Relation::RolePermission => "action type",
            Relation::UserRole => "role",
        }
    }
}

/// One persisted grant or assignment row. `display_name` is the denormalized
/// target name (action type name or role name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: Uuid,
    pub relation: Relation,
    pub holder_id: Uuid,
    pub target_id: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl Link {
    pub fn new(relation: Relation, holder_id: Uuid, target_id: Uuid, display_name: &str, now: DateTime<Utc>) -> Self {
        Link {
            id: Uuid::new_v4(),
            relation,
            holder_id,
            target_id,
            display_name: display_name.to_string(),
            created_at: now,
        }
    }
}

// =============================================================================
// RECONCILE REQUESTS
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct RolePermissionRequest {
    pub role_id: Uuid,
    pub action_id: Uuid,
    /// Desired state of the grant, not a flip.
    pub permission: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserRoleRequest {
    pub user_id: Uuid,
    pub role_id: Uuid,
    /// Desired state of the assignment, not a flip.
    pub active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileResponse {
    pub message: String,
    /// "created", "deleted" or "unchanged"
    #[schema(example = "created")]
    pub outcome: String,
}

// =============================================================================
// MATRIX VIEWS
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    pub role_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionTypeFlag {
    pub id: Uuid,
    pub name: String,
    pub permission: bool,
}

/// A role together with every action type and whether the role holds it.
#[derive(Debug, Serialize, ToSchema)]
pub struct RolePermissionMatrix {
    pub role: Role,
    #[serde(rename = "actionType")]
    pub action_types: Vec<ActionTypeFlag>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleFlag {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

/// A user together with every role and whether the user holds it.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserRoleMatrix {
    pub user: UserProfile,
    pub roles: Vec<RoleFlag>,
}
