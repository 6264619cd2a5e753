mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let t = common::spawn_app().await?;

    let (status, body) = common::send(&t.app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK, "health endpoint did not return 200");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db_ok"], true, "expected db_ok: true, got: {}", body);

    Ok(())
}

#[tokio::test]
async fn health_hides_driver_detail_when_the_store_is_down() -> Result<()> {
    let t = common::spawn_app().await?;
    t.store.pool().close().await;

    let (status, body) = common::send(&t.app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db_ok"], false);
    assert_eq!(body["db_error"], epes_auth::routes::health::DB_UNAVAILABLE);

    Ok(())
}
