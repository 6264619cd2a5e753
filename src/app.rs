use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{require_roles, roles, RoleGate};
use crate::errors::AppError;
use crate::jwt::{TokenIssuer, TokenValidator};
use crate::routes::{auth, health, rbac, users};
use crate::store::{AuthStore, SqliteStore};
use crate::utils::PasswordHasher;

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Immutable per-process state. Key material is loaded once and shared.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuthStore>,
    pub hasher: Arc<PasswordHasher>,
    pub issuer: Arc<TokenIssuer>,
    pub validator: Arc<TokenValidator>,
}

impl AppState {
    pub fn new(store: Arc<dyn AuthStore>, hasher: PasswordHasher, issuer: TokenIssuer, validator: TokenValidator) -> Self {
        Self {
            store,
            hasher: Arc::new(hasher),
            issuer: Arc::new(issuer),
            validator: Arc::new(validator),
        }
    }

    /// Reads `PRIVATE_KEY`, `JWT_PRIVATE_KEY`, `JWT_PUBLIC_KEY` and
    /// `JWT_EXP_HOURS`. Any missing or malformed value is a `Configuration`
    /// error.
    pub fn from_env(store: Arc<dyn AuthStore>) -> Result<Self, AppError> {
        Ok(Self::new(
            store,
            PasswordHasher::from_env()?,
            TokenIssuer::from_env()?,
            TokenValidator::from_env()?,
        ))
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let store: Arc<dyn AuthStore> = Arc::new(SqliteStore::new(pool));
    let state = AppState::from_env(store)?;

    build_router(state, &cors_origins_from_env())
}

/// Parses `CORS_ALLOWED` (comma separated), falling back to the local
/// frontend origin.
pub fn cors_origins_from_env() -> Vec<String> {
    let raw = std::env::var("CORS_ALLOWED").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

    if origins.is_empty() {
        vec![DEFAULT_CORS_ORIGIN.to_string()]
    } else {
        origins
    }
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Result<Router, AppError> {
    let origins = cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| AppError::configuration(format!("invalid CORS origin: {origin}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60));

    let any_session = RoleGate::authenticated(Arc::clone(&state.validator));
    let admin_only = RoleGate::new(Arc::clone(&state.validator), &[roles::ADMIN]);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route(
            "/me",
            get(auth::me).route_layer(from_fn_with_state(any_session, require_roles)),
        );

    let admin_routes = Router::new()
        .route("/users", post(users::create_user))
        .merge(rbac::routes())
        .route_layer(from_fn_with_state(admin_only, require_roles));

    let router = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
