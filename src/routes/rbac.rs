//! Role and permission administration.
//!
//! Every route here sits behind the ADMIN gate. Grant and assignment writes
//! go through the reconciler and are idempotent.

use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::{AppError, AppResult};
use crate::models::rbac::*;
use crate::models::user::UserProfile;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::utils::utc_now;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/action-types", get(list_action_types).post(create_action_type))
        .route("/role-permissions", get(get_role_permissions).put(set_role_permission))
        .route("/user-roles", get(get_user_roles).put(set_user_role))
}

// =============================================================================
// ROLES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/roles",
    tag = "Admin",
    responses((status = 200, description = "All roles, ordered by name", body = Vec<Role>))
)]
pub async fn list_roles(State(state): State<AppState>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(state.store.list_roles().await?))
}

#[utoipa::path(
    post,
    path = "/admin/roles",
    tag = "Admin",
    request_body = RoleCreateRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 409, description = "Role name already exists")
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    actor: Principal,
    Json(req): Json<RoleCreateRequest>,
) -> AppResult<(StatusCode, Json<Role>)> {
    let role = Role::new(&req.name, utc_now())?;
    state.store.insert_role(&role).await?;

    tracing::info!(actor = %actor.user_id, role_id = %role.id, name = %role.name, "role created");

    Ok((StatusCode::CREATED, Json(role)))
}

// =============================================================================
// ACTION TYPES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/action-types",
    tag = "Admin",
    responses((status = 200, description = "All action types, ordered by name", body = Vec<ActionType>))
)]
pub async fn list_action_types(State(state): State<AppState>) -> AppResult<Json<Vec<ActionType>>> {
    Ok(Json(state.store.list_action_types().await?))
}

#[utoipa::path(
    post,
    path = "/admin/action-types",
    tag = "Admin",
    request_body = ActionTypeCreateRequest,
    responses(
        (status = 201, description = "Action type created", body = ActionType),
        (status = 409, description = "Action type name already exists")
    )
)]
pub async fn create_action_type(
    State(state): State<AppState>,
    actor: Principal,
    Json(req): Json<ActionTypeCreateRequest>,
) -> AppResult<(StatusCode, Json<ActionType>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("action type name must not be empty"));
    }

    let now = utc_now();
    let action_type = ActionType {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: req.description,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_action_type(&action_type).await?;

    tracing::info!(
        actor = %actor.user_id,
        action_id = %action_type.id,
        name = %action_type.name,
        "action type created"
    );

    Ok((StatusCode::CREATED, Json(action_type)))
}

// =============================================================================
// ROLE PERMISSIONS
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/role-permissions",
    tag = "Admin",
    params(RoleQuery),
    responses(
        (status = 200, description = "Every action type with the role's permission flag", body = RolePermissionMatrix),
        (status = 404, description = "Role not found")
    )
)]
pub async fn get_role_permissions(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> AppResult<Json<RolePermissionMatrix>> {
    let role = state
        .store
        .find_role(query.role_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("role with ID {} does not exist", query.role_id)))?;

    let granted: HashSet<Uuid> = state
        .store
        .linked_targets(Relation::RolePermission, role.id)
        .await?
        .into_iter()
        .collect();

    let action_types = state
        .store
        .list_action_types()
        .await?
        .into_iter()
        .map(|a| ActionTypeFlag {
            permission: granted.contains(&a.id),
            id: a.id,
            name: a.name,
        })
        .collect();

    Ok(Json(RolePermissionMatrix { role, action_types }))
}

#[utoipa::path(
    put,
    path = "/admin/role-permissions",
    tag = "Admin",
    request_body = RolePermissionRequest,
    responses(
        (status = 200, description = "Grant reconciled", body = ReconcileResponse),
        (status = 404, description = "Role or action type not found")
    )
)]
pub async fn set_role_permission(
    State(state): State<AppState>,
    actor: Principal,
    Json(req): Json<RolePermissionRequest>,
) -> AppResult<Json<ReconcileResponse>> {
    let outcome = Reconciler::new(state.store.as_ref())
        .set_grant(req.role_id, req.action_id, req.permission)
        .await?;

    tracing::info!(
        actor = %actor.user_id,
        role_id = %req.role_id,
        action_id = %req.action_id,
        outcome = %outcome,
        "role permission reconciled"
    );

    Ok(Json(reconcile_response("role permission", outcome)))
}

// =============================================================================
// USER ROLES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/user-roles",
    tag = "Admin",
    params(UserQuery),
    responses(
        (status = 200, description = "Every role with the user's assignment flag", body = UserRoleMatrix),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_roles(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<UserRoleMatrix>> {
    let identity = state
        .store
        .find_identity(query.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user with ID {} does not exist", query.user_id)))?;

    let assigned: HashSet<Uuid> = state
        .store
        .linked_targets(Relation::UserRole, identity.id)
        .await?
        .into_iter()
        .collect();

    let roles = state
        .store
        .list_roles()
        .await?
        .into_iter()
        .map(|r| RoleFlag {
            active: assigned.contains(&r.id),
            id: r.id,
            name: r.name,
        })
        .collect();

    Ok(Json(UserRoleMatrix {
        user: UserProfile::from(&identity),
        roles,
    }))
}

#[utoipa::path(
    put,
    path = "/admin/user-roles",
    tag = "Admin",
    request_body = UserRoleRequest,
    responses(
        (status = 200, description = "Assignment reconciled", body = ReconcileResponse),
        (status = 404, description = "User or role not found")
    )
)]
pub async fn set_user_role(
    State(state): State<AppState>,
    actor: Principal,
    Json(req): Json<UserRoleRequest>,
) -> AppResult<Json<ReconcileResponse>> {
    let outcome = Reconciler::new(state.store.as_ref())
        .set_assignment(req.user_id, req.role_id, req.active)
        .await?;

    tracing::info!(
        actor = %actor.user_id,
        user_id = %req.user_id,
        role_id = %req.role_id,
        outcome = %outcome,
        "user role reconciled"
    );

    Ok(Json(reconcile_response("user role", outcome)))
}

fn reconcile_response(subject: &str, outcome: ReconcileOutcome) -> ReconcileResponse {
    let message = match outcome {
        ReconcileOutcome::Created => format!("{subject} granted"),
        ReconcileOutcome::Deleted => format!("{subject} revoked"),
        ReconcileOutcome::Unchanged => format!("{subject} already in the requested state"),
    };

    ReconcileResponse {
        message,
        outcome: outcome.as_str().to_string(),
    }
}
