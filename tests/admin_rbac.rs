mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use epes_auth::models::rbac::Relation;
use epes_auth::store::AuthStore;

async fn admin_token(t: &common::TestApp) -> Result<String> {
    common::seed_user(&t.store, "admin", "password123", &["ADMIN"]).await?;
    common::login(&t.app, "admin", "password123").await
}

fn id_of(body: &Value) -> Result<Uuid> {
    let raw = body["id"].as_str().ok_or_else(|| anyhow::anyhow!("no id in {body}"))?;
    Ok(Uuid::parse_str(raw)?)
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() -> Result<()> {
    let t = common::spawn_app().await?;
    let admin = admin_token(&t).await?;
    common::seed_user(&t.store, "manager", "password123", &["MANAGER", "EMPLOYEE"]).await?;
    let manager = common::login(&t.app, "manager", "password123").await?;

    let (status, _) = common::send(&t.app, Method::GET, "/admin/roles", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = common::send(&t.app, Method::GET, "/admin/roles", Some(&manager), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = common::send(&t.app, Method::GET, "/admin/roles", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .map(|roles| roles.iter().filter_map(|r| r["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["ADMIN", "EMPLOYEE", "MANAGER"]);

    Ok(())
}

#[tokio::test]
async fn role_names_are_upper_cased_and_unique() -> Result<()> {
    let t = common::spawn_app().await?;
    let admin = admin_token(&t).await?;

    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/admin/roles",
        Some(&admin),
        Some(json!({ "name": " hr_officer " })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "HR_OFFICER");

    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/admin/roles",
        Some(&admin),
        Some(json!({ "name": "HR_Officer" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    Ok(())
}

#[tokio::test]
async fn grant_reconciliation_is_idempotent() -> Result<()> {
    let t = common::spawn_app().await?;
    let admin = admin_token(&t).await?;

    let (_, role) = common::send(&t.app, Method::POST, "/admin/roles", Some(&admin), Some(json!({ "name": "manager" }))).await?;
    let (status, action) = common::send(
        &t.app,
        Method::POST,
        "/admin/action-types",
        Some(&admin),
        Some(json!({ "name": "evaluation.submit", "description": "Submit a 360 evaluation" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let role_id = id_of(&role)?;
    let action_id = id_of(&action)?;

    let mut outcomes = Vec::new();
    for permission in [true, true, false, false] {
        let (status, body) = common::send(
            &t.app,
            Method::PUT,
            "/admin/role-permissions",
            Some(&admin),
            Some(json!({ "role_id": role_id, "action_id": action_id, "permission": permission })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
        outcomes.push(body["outcome"].as_str().unwrap_or_default().to_string());

        let rows = t.store.count_links(Relation::RolePermission, role_id, action_id).await?;
        assert_eq!(rows, i64::from(permission));
    }

    assert_eq!(outcomes, ["created", "unchanged", "deleted", "unchanged"]);

    Ok(())
}

#[tokio::test]
async fn permission_matrix_reflects_grants() -> Result<()> {
    let t = common::spawn_app().await?;
    let admin = admin_token(&t).await?;

    let (_, role) = common::send(&t.app, Method::POST, "/admin/roles", Some(&admin), Some(json!({ "name": "manager" }))).await?;
    let (_, granted) = common::send(&t.app, Method::POST, "/admin/action-types", Some(&admin), Some(json!({ "name": "kpi.review" }))).await?;
    let (_, other) = common::send(&t.app, Method::POST, "/admin/action-types", Some(&admin), Some(json!({ "name": "payroll.view" }))).await?;
    let role_id = id_of(&role)?;

    let (status, _) = common::send(
        &t.app,
        Method::PUT,
        "/admin/role-permissions",
        Some(&admin),
        Some(json!({ "role_id": role_id, "action_id": id_of(&granted)?, "permission": true })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/admin/role-permissions?role_id={role_id}");
    let (status, matrix) = common::send(&t.app, Method::GET, &uri, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matrix["role"]["name"], "MANAGER");

    let flags = matrix["actionType"].as_array().cloned().unwrap_or_default();
    assert_eq!(flags.len(), 2);
    for flag in flags {
        let expected = flag["id"] == granted["id"];
        assert_eq!(flag["permission"], expected, "flag {flag}");
        if !expected {
            assert_eq!(flag["id"], other["id"]);
        }
    }

    Ok(())
}

#[tokio::test]
async fn reconciling_unknown_ids_is_not_found() -> Result<()> {
    let t = common::spawn_app().await?;
    let admin = admin_token(&t).await?;
    let (_, action) = common::send(&t.app, Method::POST, "/admin/action-types", Some(&admin), Some(json!({ "name": "kpi.review" }))).await?;

    let (status, body) = common::send(
        &t.app,
        Method::PUT,
        "/admin/role-permissions",
        Some(&admin),
        Some(json!({ "role_id": Uuid::new_v4(), "action_id": id_of(&action)?, "permission": true })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = common::send(
        &t.app,
        Method::GET,
        &format!("/admin/user-roles?user_id={}", Uuid::new_v4()),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn role_assignment_changes_what_the_next_login_carries() -> Result<()> {
    let t = common::spawn_app().await?;
    let admin = admin_token(&t).await?;
    let employee = common::seed_user(&t.store, "saraa", "password123", &["EMPLOYEE"]).await?;
    let manager = common::ensure_role(&t.store, "MANAGER").await?;

    for active in [true, true] {
        let (status, _) = common::send(
            &t.app,
            Method::PUT,
            "/admin/user-roles",
            Some(&admin),
            Some(json!({ "user_id": employee.id, "role_id": manager.id, "active": active })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(t.store.count_links(Relation::UserRole, employee.id, manager.id).await?, 1);

    let (_, matrix) = common::send(
        &t.app,
        Method::GET,
        &format!("/admin/user-roles?user_id={}", employee.id),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(matrix["user"]["login_id"], "saraa");
    let active: Vec<&str> = matrix["roles"]
        .as_array()
        .map(|roles| {
            roles
                .iter()
                .filter(|r| r["active"] == true)
                .filter_map(|r| r["name"].as_str())
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(active, vec!["EMPLOYEE", "MANAGER"]);

    let token = common::login(&t.app, "saraa", "password123").await?;
    let (_, me) = common::send(&t.app, Method::GET, "/auth/me", Some(&token), None).await?;
    assert_eq!(me["roles"], json!(["EMPLOYEE", "MANAGER"]));

    let (status, body) = common::send(
        &t.app,
        Method::PUT,
        "/admin/user-roles",
        Some(&admin),
        Some(json!({ "user_id": employee.id, "role_id": manager.id, "active": false })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "deleted");
    assert_eq!(t.store.count_links(Relation::UserRole, employee.id, manager.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn created_users_can_log_in_once_given_a_role() -> Result<()> {
    let t = common::spawn_app().await?;
    let admin = admin_token(&t).await?;

    let payload = json!({
        "first_name": "Tuya",
        "last_name": "Bold",
        "login_id": "tuya",
        "email_work": "tuya@company.mn",
        "phone_number_personal": "88001122",
        "password": "password123"
    });

    let (status, user) = common::send(&t.app, Method::POST, "/admin/users", Some(&admin), Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {user}");
    assert!(user.get("password").is_none());

    let (status, _) = common::send(&t.app, Method::POST, "/admin/users", Some(&admin), Some(payload)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = common::send(
        &t.app,
        Method::POST,
        "/admin/users",
        Some(&admin),
        Some(json!({
            "first_name": "Short",
            "last_name": "Pass",
            "login_id": "short",
            "email_work": "short@company.mn",
            "password": "short"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    // no role yet: credentials are fine but no token is issued
    let (status, _) = common::send(
        &t.app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "login_id": "tuya", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let employee = common::ensure_role(&t.store, "EMPLOYEE").await?;
    let (status, _) = common::send(
        &t.app,
        Method::PUT,
        "/admin/user-roles",
        Some(&admin),
        Some(json!({ "user_id": id_of(&user)?, "role_id": employee.id, "active": true })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    common::login(&t.app, "tuya", "password123").await?;

    Ok(())
}
