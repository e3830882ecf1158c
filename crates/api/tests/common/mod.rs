//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use atelier_api::auth::jwt::{generate_access_token, JwtConfig};
use atelier_api::config::ServerConfig;
use atelier_api::router::build_app_router;
use atelier_api::state::AppState;
use atelier_events::EventBus;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Datelike, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        audit_retention_days: 3650,
        signing_link_ttl_hours: 168,
        outbox_poll_interval_secs: 10,
        outbox_batch_size: 50,
    }
}

/// Build the full application router, with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        email: None,
    };
    build_app_router(state, &config)
}

pub fn year() -> i32 {
    Utc::now().year()
}

/// A bearer token for a fresh user of `tenant_id` with `role`.
pub fn token(tenant_id: Uuid, role: &str) -> String {
    generate_access_token(Uuid::new_v4(), tenant_id, role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    app.oneshot(request(Method::GET, uri, token, None)).await.unwrap()
}

pub async fn post(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, token, None)).await.unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, token, Some(body)))
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_tenant(pool: &PgPool, siren: Option<&str>) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO tenants (name, siren, invoice_trigger_status) \
         VALUES ('Atelier Thermolaquage', $1, 'pret') RETURNING id",
    )
    .bind(siren)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_client(pool: &PgPool, tenant_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO clients (tenant_id, name) VALUES ($1, 'Ferronnerie Leroy') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A project with totals 500,00 HT / 100,00 TVA and no powder.
pub async fn seed_project(pool: &PgPool, tenant_id: Uuid, client_id: Uuid, status: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO projects (tenant_id, numero, name, status, client_id, \
            total_ht_cents, total_tva_cents, total_ttc_cents) \
         VALUES ($1, $2, 'Portail acier', $3, $4, 50000, 10000, 60000) RETURNING id",
    )
    .bind(tenant_id)
    .bind(format!("PROJ-{}-0001", year()))
    .bind(status)
    .bind(client_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// An unsigned quote with totals 1000,00 HT / 200,00 TVA.
pub async fn seed_quote(pool: &PgPool, tenant_id: Uuid, client_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO quotes (tenant_id, numero, client_id, status, items, \
            total_ht_cents, total_tva_cents, total_ttc_cents) \
         VALUES ($1, $2, $3, 'envoye', '[]'::jsonb, 100000, 20000, 120000) RETURNING id",
    )
    .bind(tenant_id)
    .bind(format!("DEV-{}-0001", year()))
    .bind(client_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A `complete` invoice of 120,00 TTC issued today.
pub async fn seed_invoice(pool: &PgPool, tenant_id: Uuid, client_id: Uuid, numero: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO invoices (tenant_id, numero, client_id, invoice_type, \
            total_ht_cents, total_tva_cents, total_ttc_cents, due_date) \
         VALUES ($1, $2, $3, 'complete', 10000, 2000, 12000, CURRENT_DATE + 30) RETURNING id",
    )
    .bind(tenant_id)
    .bind(numero)
    .bind(client_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
