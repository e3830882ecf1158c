//! End-to-end tests of the automation endpoints through the full router.

mod common;

use axum::http::{header, StatusCode};
use common::*;
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Project status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn transitions_reflect_the_caller_role(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let project = seed_project(&pool, tenant, client, "sechage").await;
    let uri = format!("/api/v1/projects/{project}/transitions");

    let member = token(tenant, "member");
    let response = get(build_test_app(pool.clone()), &uri, Some(&member)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "sechage");
    assert_eq!(json["data"]["allowed"], json!(["controle_qualite"]));

    let owner = token(tenant, "owner");
    let json = body_json(get(build_test_app(pool), &uri, Some(&owner)).await).await;
    assert_eq!(json["data"]["allowed"], json!(["controle_qualite", "annule"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn project_of_another_tenant_is_not_found(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let other = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let project = seed_project(&pool, tenant, client, "devis").await;

    let t = token(other, "owner");
    let uri = format!("/api/v1/projects/{project}/transitions");
    let response = get(build_test_app(pool), &uri, Some(&t)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reaching_trigger_status_creates_invoice(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let project = seed_project(&pool, tenant, client, "controle_qualite").await;
    let t = token(tenant, "member");
    let uri = format!("/api/v1/projects/{project}/status");

    let response = post_json(build_test_app(pool.clone()), &uri, Some(&t), json!({"status": "pret"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["success"], true);
    assert_eq!(data["previous_status"], "controle_qualite");
    assert_eq!(data["status"], "pret");
    assert_eq!(data["facture_created"], true);
    assert_eq!(data["facture_numero"], format!("FACT-{}-0001", year()));

    // Repeating the move is refused with the statuses still reachable.
    let response = post_json(build_test_app(pool), &uri, Some(&t), json!({"status": "pret"})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "invalid_transition");
    assert_eq!(json["allowed"], json!(["livre"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn member_cannot_cancel_a_project(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let project = seed_project(&pool, tenant, client, "en_preparation").await;
    let uri = format!("/api/v1/projects/{project}/status");

    let member = token(tenant, "member");
    let response =
        post_json(build_test_app(pool.clone()), &uri, Some(&member), json!({"status": "annule"})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "forbidden");
    assert_eq!(json["allowed"], json!(["en_traitement"]));

    let admin = token(tenant, "admin");
    let response = post_json(build_test_app(pool), &uri, Some(&admin), json!({"status": "annule"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["facture_created"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_status_is_a_validation_error(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let project = seed_project(&pool, tenant, client, "devis").await;
    let t = token(tenant, "member");

    let uri = format!("/api/v1/projects/{project}/status");
    let response = post_json(build_test_app(pool), &uri, Some(&t), json!({"status": "termine"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "validation_error");
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn signing_twice_is_a_conflict(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let quote = seed_quote(&pool, tenant, client).await;
    let t = token(tenant, "member");
    let uri = format!("/api/v1/quotes/{quote}/sign");
    let body = json!({"signer_name": "Jeanne Leroy"});

    let response = post_json(build_test_app(pool.clone()), &uri, Some(&t), body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["projet_created"], true);
    assert_eq!(data["projet_numero"], format!("PROJ-{}-0001", year()));

    let response = post_json(build_test_app(pool), &uri, Some(&t), body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "already_signed");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn blank_signer_name_is_rejected(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let quote = seed_quote(&pool, tenant, client).await;
    let t = token(tenant, "member");

    let uri = format!("/api/v1/quotes/{quote}/sign");
    let response = post_json(build_test_app(pool), &uri, Some(&t), json!({"signer_name": ""})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn public_link_signs_once(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let quote = seed_quote(&pool, tenant, client).await;
    let t = token(tenant, "member");

    let uri = format!("/api/v1/quotes/{quote}/signing-link");
    let response = post(build_test_app(pool.clone()), &uri, Some(&t)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    let signing_token = data["token"].as_str().unwrap().to_string();
    assert_eq!(data["quote_id"], quote.to_string());

    let body = json!({"token": signing_token, "signer_name": "Client Leroy"});
    let response = post_json(build_test_app(pool.clone()), "/api/v1/public/quotes/sign", None, body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["projet_created"], true);

    let response = post_json(build_test_app(pool), "/api/v1/public/quotes/sign", None, body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn payments_are_bounded_by_the_total(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let invoice = seed_invoice(&pool, tenant, client, "FACT-2026-0001").await;
    let t = token(tenant, "member");
    let uri = format!("/api/v1/invoices/{invoice}/payments");

    let response = post_json(build_test_app(pool.clone()), &uri, Some(&t), json!({"amount_cents": 2000})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["payment_status"], "partial");
    assert_eq!(data["amount_paid_cents"], 2000);

    let response = post_json(build_test_app(pool.clone()), &uri, Some(&t), json!({"amount_cents": 50000})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(build_test_app(pool.clone()), &uri, Some(&t), json!({"amount_cents": 0})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(build_test_app(pool), &uri, Some(&t), json!({"amount_cents": 10000})).await;
    assert_eq!(body_json(response).await["data"]["payment_status"], "paid");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refund_requires_privileged_role(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let invoice = seed_invoice(&pool, tenant, client, "FACT-2026-0001").await;
    let uri = format!("/api/v1/invoices/{invoice}/refund");

    let member = token(tenant, "member");
    let response = post(build_test_app(pool.clone()), &uri, Some(&member)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let pay = format!("/api/v1/invoices/{invoice}/payments");
    post_json(build_test_app(pool.clone()), &pay, Some(&member), json!({"amount_cents": 12000})).await;

    let owner = token(tenant, "owner");
    let response = post(build_test_app(pool), &uri, Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["payment_status"], "refunded");
}

// ---------------------------------------------------------------------------
// Numbering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn numero_generation_follows_the_prefix(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let t = token(tenant, "member");

    let response = post(build_test_app(pool.clone()), "/api/v1/numeros/bon_livraison", Some(&t)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["document_type"], "bon_livraison");
    assert!(data["numero"].as_str().unwrap().starts_with(&format!("BL-{}-", year())));

    let response = post(build_test_app(pool), "/api/v1/numeros/commande", Some(&t)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Privileged endpoints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_jobs_are_privileged(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let member = token(tenant, "member");
    let owner = token(tenant, "owner");

    for uri in [
        "/api/v1/admin/numeros/repair",
        "/api/v1/admin/jobs/stock-alerts",
        "/api/v1/admin/jobs/audit-retention",
        "/api/v1/admin/jobs/outbox",
    ] {
        let response = post(build_test_app(pool.clone()), uri, Some(&member)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");

        let response = post(build_test_app(pool.clone()), uri, Some(&owner)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn fec_export_is_named_after_the_siren(pool: PgPool) {
    let tenant = seed_tenant(&pool, Some("123456789")).await;
    let client = seed_client(&pool, tenant).await;
    seed_invoice(&pool, tenant, client, &format!("FACT-{}-0001", year())).await;
    let owner = token(tenant, "owner");

    let uri = format!("/api/v1/exports/fec?year={}", year());
    let response = get(build_test_app(pool), &uri, Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"123456789FEC{}1231.txt\"", year())
    );

    let body = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<_> = body.lines().collect();
    assert!(lines[0].starts_with("JournalCode|"));
    assert_eq!(lines.len(), 4);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn fec_export_requires_a_siren(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let owner = token(tenant, "owner");

    let uri = format!("/api/v1/exports/fec?year={}", year());
    let response = get(build_test_app(pool), &uri, Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "validation_error");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn audit_trail_records_transitions_and_verifies(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let client = seed_client(&pool, tenant).await;
    let project = seed_project(&pool, tenant, client, "devis").await;
    let member = token(tenant, "member");
    let owner = token(tenant, "owner");

    let uri = format!("/api/v1/projects/{project}/status");
    for status in ["en_preparation", "en_traitement"] {
        let response = post_json(build_test_app(pool.clone()), &uri, Some(&member), json!({"status": status})).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get(build_test_app(pool.clone()), "/api/v1/audit-logs", Some(&member)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = "/api/v1/audit-logs?action_type=project.status_change";
    let data = body_json(get(build_test_app(pool.clone()), uri, Some(&owner)).await).await["data"].clone();
    assert_eq!(data["total"], 2);
    assert_eq!(data["items"][0]["details_json"]["after"]["status"], "en_traitement");

    let response = get(build_test_app(pool), "/api/v1/audit-logs/integrity", Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["checked"], 2);
    assert!(data["first_broken"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn notifications_list_is_scoped_to_the_tenant(pool: PgPool) {
    let tenant = seed_tenant(&pool, None).await;
    let t = token(tenant, "member");

    let response = get(build_test_app(pool), "/api/v1/notifications?unread_only=true", Some(&t)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}
