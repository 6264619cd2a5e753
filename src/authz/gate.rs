use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::AppError;
use crate::jwt::TokenValidator;

/// Per-route access policy: the validator plus the role allow-list.
///
/// `allowed == None` admits any verified session regardless of roles.
#[derive(Debug, Clone)]
pub struct RoleGate {
    validator: Arc<TokenValidator>,
    allowed: Option<Arc<[String]>>,
}

impl RoleGate {
    pub fn new(validator: Arc<TokenValidator>, allowed: &[&str]) -> Self {
        Self {
            validator,
            allowed: Some(allowed.iter().map(|r| r.to_string()).collect()),
        }
    }

    pub fn authenticated(validator: Arc<TokenValidator>) -> Self {
        Self {
            validator,
            allowed: None,
        }
    }

    pub fn allowed(&self) -> Option<&[String]> {
        self.allowed.as_deref()
    }
}

/// Access middleware for `axum::middleware::from_fn_with_state`.
///
/// Verifies the bearer token, enforces the gate's allow-list and forwards the
/// caller's `Principal` through the request extensions. Never touches the
/// data store.
pub async fn require_roles(State(gate): State<RoleGate>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str())
        .transpose()
        .map_err(|_| AppError::unauthenticated("malformed authorization header"))?;

    let principal = match gate.allowed() {
        Some(allowed) => gate.validator.validate(header, allowed)?,
        None => gate.validator.authenticate(header)?,
    };

    tracing::debug!(
        user_id = %principal.user_id,
        session_id = %principal.session_id,
        path = %request.uri().path(),
        "request authorized"
    );

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
