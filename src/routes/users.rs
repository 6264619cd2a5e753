use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::authz::Principal;
use crate::errors::AppResult;
use crate::models::user::{CreateUserRequest, UserProfile};
use crate::utils::{utc_now, validate_password};

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "Admin",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "login_id already in use")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    actor: Principal,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    validate_password(&payload.password)?;

    let password_hash = state.hasher.hash(&payload.password);
    let identity = payload.into_identity(password_hash, utc_now())?;

    state.store.insert_identity(&identity).await?;

    tracing::info!(
        actor = %actor.user_id,
        user_id = %identity.id,
        login_id = %identity.login_id,
        "user created"
    );

    Ok((StatusCode::CREATED, Json(UserProfile::from(&identity))))
}
