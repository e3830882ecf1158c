//! Seed helpers shared by the database integration tests.

#![allow(dead_code)]

use atelier_db::automation::Actor;
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub fn year() -> i32 {
    Utc::now().year()
}

pub fn actor(role: &str) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        role: role.to_string(),
    }
}

pub async fn seed_tenant(pool: &PgPool, invoice_trigger: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO tenants (name, siren, invoice_trigger_status) \
         VALUES ('Atelier Thermolaquage', '123456789', $1) RETURNING id",
    )
    .bind(invoice_trigger)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_member(pool: &PgPool, tenant_id: Uuid, role: &str, email: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO tenant_members (tenant_id, user_id, role, email) VALUES ($1, $2, $3, $4)")
        .bind(tenant_id)
        .bind(user_id)
        .bind(role)
        .bind(email)
        .execute(pool)
        .await
        .unwrap();
    user_id
}

pub async fn seed_client(pool: &PgPool, tenant_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO clients (tenant_id, name, email) \
         VALUES ($1, 'Serrurerie Martin', 'contact@martin.example') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_powder(pool: &PgPool, tenant_id: Uuid, stock_kg: f64, threshold_kg: f64) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO powders (tenant_id, reference, name, stock_kg, alert_threshold_kg) \
         VALUES ($1, $2, 'RAL 9005 Noir mat', $3, $4) RETURNING id",
    )
    .bind(tenant_id)
    .bind(format!("RAL-{}", &Uuid::new_v4().simple().to_string()[..6]))
    .bind(stock_kg)
    .bind(threshold_kg)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A project with totals 500,00 HT / 100,00 TVA and 2.5 kg estimated powder.
pub async fn seed_project(
    pool: &PgPool,
    tenant_id: Uuid,
    client_id: Uuid,
    powder_id: Option<Uuid>,
    status: &str,
    numero: &str,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO projects (tenant_id, numero, name, status, client_id, powder_id, \
            total_ht_cents, total_tva_cents, total_ttc_cents, estimated_consumption_kg) \
         VALUES ($1, $2, 'Portail acier', $3, $4, $5, 50000, 10000, 60000, 2.5) RETURNING id",
    )
    .bind(tenant_id)
    .bind(numero)
    .bind(status)
    .bind(client_id)
    .bind(powder_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// An unsigned quote with two line items and totals 1000,00 HT / 200,00 TVA.
pub async fn seed_quote(
    pool: &PgPool,
    tenant_id: Uuid,
    client_id: Uuid,
    powder_id: Option<Uuid>,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO quotes (tenant_id, numero, client_id, powder_id, status, items, \
            total_ht_cents, total_tva_cents, total_ttc_cents, estimated_consumption_kg) \
         VALUES ($1, $2, $3, $4, 'envoye', $5, 100000, 20000, 120000, 4.0) RETURNING id",
    )
    .bind(tenant_id)
    .bind(format!("DEV-{}-0001", year()))
    .bind(client_id)
    .bind(powder_id)
    .bind(serde_json::json!([
        { "designation": "Garde-corps", "quantite": 4, "prix_unitaire_cents": 15000 },
        { "designation": "Sablage", "quantite": 1, "prix_unitaire_cents": 40000 }
    ]))
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a deposit invoice for a project.
pub async fn seed_deposit(pool: &PgPool, tenant_id: Uuid, client_id: Uuid, project_id: Uuid) {
    sqlx::query(
        "INSERT INTO invoices (tenant_id, numero, project_id, client_id, invoice_type, \
            total_ht_cents, total_tva_cents, total_ttc_cents, due_date) \
         VALUES ($1, $2, $3, $4, 'acompte', 15000, 3000, 18000, CURRENT_DATE)",
    )
    .bind(tenant_id)
    .bind(format!("FACT-{}-0001", year()))
    .bind(project_id)
    .bind(client_id)
    .execute(pool)
    .await
    .unwrap();
}
