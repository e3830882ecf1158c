//! Health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn health_check_returns_ok_with_json(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/this-route-does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn response_contains_x_request_id_header(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/health", None).await;
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn api_requires_bearer_token(pool: PgPool) {
    let uri = format!("/api/v1/projects/{}/transitions", uuid::Uuid::new_v4());
    let response = get(common::build_test_app(pool), &uri, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "unauthorized");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn forged_token_is_rejected(pool: PgPool) {
    let uri = format!("/api/v1/projects/{}/transitions", uuid::Uuid::new_v4());
    let response = get(common::build_test_app(pool), &uri, Some("not.a.jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
