mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

#[tokio::test]
async fn login_returns_profile_roles_and_a_working_token() -> Result<()> {
    let t = common::spawn_app().await?;
    let user = common::seed_user(&t.store, "bat", "password123", &["EMPLOYEE", "ADMIN"]).await?;

    let before = Utc::now().timestamp();
    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "bat", "password": "password123" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["login_id"], "bat");
    assert_eq!(body["email_work"], "bat@company.mn");
    assert_eq!(body["roles"], json!(["ADMIN", "EMPLOYEE"]));
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let token = body["token"].as_str().unwrap_or_default();
    assert_eq!(token.split('.').count(), 3);

    let lifetime = body["expires_at"].as_i64().unwrap_or_default() - before;
    assert!((24 * 3600 - 5..=24 * 3600 + 5).contains(&lifetime), "lifetime was {lifetime}s");

    let (status, me) = common::send(&t.app, Method::GET, "/auth/me", Some(token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user_id"], user.id.to_string());
    assert_eq!(me["session_id"], body["session_id"]);
    assert_eq!(me["email"], "bat@company.mn");

    Ok(())
}

#[tokio::test]
async fn each_login_gets_a_fresh_session() -> Result<()> {
    let t = common::spawn_app().await?;
    common::seed_user(&t.store, "dorj", "password123", &["EMPLOYEE"]).await?;

    let first = common::login(&t.app, "dorj", "password123").await?;
    let second = common::login(&t.app, "dorj", "password123").await?;

    let (_, a) = common::send(&t.app, Method::GET, "/auth/me", Some(&first), None).await?;
    let (_, b) = common::send(&t.app, Method::GET, "/auth/me", Some(&second), None).await?;
    assert_ne!(a["session_id"], b["session_id"]);

    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_login_look_the_same() -> Result<()> {
    let t = common::spawn_app().await?;
    common::seed_user(&t.store, "bat", "password123", &["EMPLOYEE"]).await?;

    let (wrong_status, wrong_body) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "bat", "password": "not-the-password" })),
    )
    .await?;
    let (unknown_status, unknown_body) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "nobody", "password": "password123" })),
    )
    .await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "invalid_credentials");

    Ok(())
}

#[tokio::test]
async fn expired_account_is_refused_only_after_password_check() -> Result<()> {
    let t = common::spawn_app().await?;
    let now = Utc::now();
    common::seed_user_with_window(
        &t.store,
        "former",
        "password123",
        &["EMPLOYEE"],
        now - Duration::days(60),
        Some(now - Duration::days(1)),
    )
    .await?;

    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "former", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_inactive");

    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "former", "password": "wrong-password" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    Ok(())
}

#[tokio::test]
async fn future_start_date_is_inactive() -> Result<()> {
    let t = common::spawn_app().await?;
    common::seed_user_with_window(
        &t.store,
        "newhire",
        "password123",
        &["EMPLOYEE"],
        Utc::now() + Duration::days(7),
        None,
    )
    .await?;

    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "newhire", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_inactive");

    Ok(())
}

#[tokio::test]
async fn user_without_roles_gets_no_token() -> Result<()> {
    let t = common::spawn_app().await?;
    common::seed_user(&t.store, "norole", "password123", &[]).await?;

    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "norole", "password": "password123" })),
    )
    .await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "user_or_roles_not_found");
    assert!(body.get("token").is_none());

    Ok(())
}

#[tokio::test]
async fn me_requires_a_valid_bearer_token() -> Result<()> {
    let t = common::spawn_app().await?;
    common::seed_user(&t.store, "bat", "password123", &["EMPLOYEE"]).await?;
    let token = common::login(&t.app, "bat", "password123").await?;

    let (status, body) = common::send(&t.app, Method::GET, "/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    // flip one character in the middle of the signature
    let sig_start = token.rfind('.').map(|i| i + 1).unwrap_or(0);
    let idx = sig_start + (token.len() - sig_start) / 2;
    let mut bytes = token.clone().into_bytes();
    bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes)?;

    let (status, _) = common::send(&t.app, Method::GET, "/auth/me", Some(&tampered), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::send(&t.app, Method::GET, "/auth/me", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
