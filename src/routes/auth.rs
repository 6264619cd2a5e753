use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::authz::Principal;
use crate::credentials::CredentialVerifier;
use crate::errors::AppResult;
use crate::models::user::{LoginRequest, LoginResponse, UserProfile};
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account inactive, or user holds no roles")
    ),
    security(())
)]
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> AppResult<Json<LoginResponse>> {
    let now = utc_now();

    let verified = CredentialVerifier::new(state.store.as_ref(), &state.hasher)
        .verify(&payload.login_id, &payload.password, now)
        .await?;

    let session = state.issuer.issue(state.store.as_ref(), verified.identity.id, now).await?;

    tracing::info!(
        user_id = %verified.identity.id,
        session_id = %session.claims.session_id,
        "login succeeded"
    );

    Ok(Json(LoginResponse {
        user: UserProfile::from(&verified.identity),
        roles: session.claims.roles,
        session_id: session.claims.session_id,
        expires_at: session.claims.exp,
        token: session.token,
    }))
}

/// Echoes the verified session. Any role is accepted.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current session", body = Principal),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(principal: Principal) -> AppResult<Json<Principal>> {
    Ok(Json(principal))
}
