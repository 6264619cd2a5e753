#![allow(dead_code)]

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use epes_auth::create_app;
use epes_auth::models::rbac::{Link, Relation, Role};
use epes_auth::models::user::Identity;
use epes_auth::store::{AuthStore, SqliteStore};
use epes_auth::utils::PasswordHasher;

pub const HASH_SECRET: &str = "integration-secret";

pub struct TestApp {
    pub app: Router,
    pub store: SqliteStore,
    // keeps the database file alive for the test's duration
    _dir: TempDir,
}

fn configure_env() {
    let private_pem = include_bytes!("../fixtures/jwt_private.pem");
    let public_pem = include_bytes!("../fixtures/jwt_public.pem");

    std::env::set_var("PRIVATE_KEY", HASH_SECRET);
    std::env::set_var("JWT_PRIVATE_KEY", BASE64_STANDARD.encode(private_pem));
    std::env::set_var("JWT_PUBLIC_KEY", BASE64_STANDARD.encode(public_pem));
    std::env::set_var("JWT_EXP_HOURS", "24");
}

pub async fn spawn_app() -> Result<TestApp> {
    let dir = tempdir()?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    configure_env();
    let app = create_app(pool.clone()).await?;

    Ok(TestApp {
        app,
        store: SqliteStore::new(pool),
        _dir: dir,
    })
}

pub fn hasher() -> PasswordHasher {
    PasswordHasher::new(HASH_SECRET).expect("non-empty secret")
}

/// Returns the role with `name`, creating it when missing.
pub async fn ensure_role(store: &SqliteStore, name: &str) -> Result<Role> {
    let name = Role::normalize_name(name)?;
    if let Some(role) = store.list_roles().await?.into_iter().find(|r| r.name == name) {
        return Ok(role);
    }

    let role = Role::new(&name, Utc::now())?;
    store.insert_role(&role).await?;
    Ok(role)
}

pub async fn seed_user(store: &SqliteStore, login_id: &str, password: &str, roles: &[&str]) -> Result<Identity> {
    seed_user_with_window(store, login_id, password, roles, Utc::now() - Duration::days(30), None).await
}

pub async fn seed_user_with_window(
    store: &SqliteStore,
    login_id: &str,
    password: &str,
    roles: &[&str],
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<Identity> {
    let now = Utc::now();
    let identity = Identity {
        id: Uuid::new_v4(),
        first_name: "Bat".into(),
        last_name: "Erdene".into(),
        login_id: login_id.into(),
        email_work: format!("{login_id}@company.mn"),
        email_personal: None,
        phone_number_work: None,
        phone_number_personal: Some("99112233".into()),
        is_active: Some(true),
        active_start_date: start,
        active_end_date: end,
        password_hash: hasher().hash(password),
        created_at: now,
        updated_at: now,
    };
    store.insert_identity(&identity).await?;

    for name in roles {
        let role = ensure_role(store, name).await?;
        let link = Link::new(Relation::UserRole, identity.id, role.id, &role.name, now);
        store.link_if_absent(&link).await?;
    }

    Ok(identity)
}

/// Sends one request through the router and returns the status and the JSON
/// body (`Value::Null` for an empty body).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

/// Logs in and returns the session token.
pub async fn login(app: &Router, login_id: &str, password: &str) -> Result<String> {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(serde_json::json!({ "login_id": login_id, "password": password })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed with {status}: {body}");

    body["token"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| anyhow::anyhow!("login response without token: {body}"))
}
