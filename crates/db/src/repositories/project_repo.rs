//! Repository for the `projects` table.
//!
//! Every query is scoped by `tenant_id`.

use atelier_core::project_status::ProjectStatus;
use atelier_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::project::{CreateProject, Project};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, tenant_id, numero, name, status, client_id, powder_id, quote_id, items, \
    deposit_date, promised_date, delivered_date, total_ht_cents, total_tva_cents, \
    total_ttc_cents, estimated_consumption_kg, stock_consumed, auto_created, \
    created_at, updated_at";

/// Provides queries and updates for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in `devis` status, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        tenant_id: DbId,
        numero: &str,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (tenant_id, numero, name, status, client_id, powder_id, \
                quote_id, items, deposit_date, promised_date, total_ht_cents, \
                total_tva_cents, total_ttc_cents, estimated_consumption_kg, auto_created) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(numero)
            .bind(&input.name)
            .bind(ProjectStatus::Devis.as_str())
            .bind(input.client_id)
            .bind(input.powder_id)
            .bind(input.quote_id)
            .bind(&input.items)
            .bind(input.deposit_date)
            .bind(input.promised_date)
            .bind(input.totals.ht)
            .bind(input.totals.tva)
            .bind(input.totals.ttc)
            .bind(input.estimated_consumption_kg)
            .bind(input.auto_created)
            .fetch_one(conn)
            .await
    }

    /// Find a project by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE tenant_id = $1 AND id = $2");
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project and lock its row until the surrounding transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Persist a new status. `set_delivered` stamps `delivered_date` with today.
    pub async fn update_status(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
        status: ProjectStatus,
        set_delivered: bool,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET \
                status = $3, \
                delivered_date = CASE WHEN $4 THEN CURRENT_DATE ELSE delivered_date END, \
                updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(status.as_str())
            .bind(set_delivered)
            .fetch_one(conn)
            .await
    }

    /// Flag a project's powder as consumed.
    pub async fn mark_stock_consumed(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE projects SET stock_consumed = true, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Count projects created from a given quote.
    pub async fn count_for_quote(
        pool: &PgPool,
        tenant_id: DbId,
        quote_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM projects WHERE tenant_id = $1 AND quote_id = $2",
        )
        .bind(tenant_id)
        .bind(quote_id)
        .fetch_one(pool)
        .await
    }
}
