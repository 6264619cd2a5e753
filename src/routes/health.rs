use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::AppResult;

/// Reported instead of the driver error, which stays in the logs.
pub const DB_UNAVAILABLE: &str = "data store unavailable";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub db_error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse)),
    security(())
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(HealthResponse { status: "ok", db_ok: true, db_error: None })),
        Err(e) => {
            tracing::warn!(error = %e, "health check: data store unreachable");
            Ok(Json(HealthResponse {
                status: "ok",
                db_ok: false,
                db_error: Some(DB_UNAVAILABLE.to_string()),
            }))
        }
    }
}
