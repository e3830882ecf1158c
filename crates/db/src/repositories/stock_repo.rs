//! Repository for `powders`, `stock_movements` and `stock_alerts`.

use atelier_core::stock::{self, movement_reasons};
use atelier_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::powder::{Powder, PowderAlertState, StockAlert};

const POWDER_COLUMNS: &str =
    "id, tenant_id, reference, name, stock_kg, alert_threshold_kg, created_at, updated_at";

const ALERT_COLUMNS: &str =
    "id, tenant_id, powder_id, stock_kg, threshold_kg, resolved_at, created_at";

pub struct StockRepo;

impl StockRepo {
    pub async fn find_powder(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Powder>, sqlx::Error> {
        let query =
            format!("SELECT {POWDER_COLUMNS} FROM powders WHERE tenant_id = $1 AND id = $2");
        sqlx::query_as::<_, Powder>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record a project's powder consumption and decrement the stock.
    ///
    /// Returns the new stock level, or `None` when the project already has a
    /// consumption movement or the powder does not belong to the tenant.
    pub async fn consume_for_project(
        conn: &mut PgConnection,
        tenant_id: DbId,
        powder_id: DbId,
        project_id: DbId,
        quantity_kg: f64,
        actor_id: Option<DbId>,
    ) -> Result<Option<f64>, sqlx::Error> {
        let inserted = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO stock_movements (tenant_id, powder_id, project_id, quantity_kg, reason, created_by) \
             SELECT $1, p.id, $3, $4, $5, $6 FROM powders p WHERE p.tenant_id = $1 AND p.id = $2 \
             ON CONFLICT (project_id) WHERE reason = 'consumption' DO NOTHING \
             RETURNING id",
        )
        .bind(tenant_id)
        .bind(powder_id)
        .bind(project_id)
        .bind(-quantity_kg)
        .bind(movement_reasons::CONSUMPTION)
        .bind(actor_id)
        .fetch_optional(&mut *conn)
        .await?;

        if inserted.is_none() {
            return Ok(None);
        }

        let current = sqlx::query_scalar::<_, f64>(
            "SELECT stock_kg FROM powders WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(powder_id)
        .fetch_one(&mut *conn)
        .await?;
        let level = stock::stock_after_consumption(current, quantity_kg);

        sqlx::query("UPDATE powders SET stock_kg = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(powder_id)
            .bind(level)
            .execute(conn)
            .await?;
        Ok(Some(level))
    }

    /// Every powder of the tenant with its open alert, if any.
    pub async fn list_alert_states(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<Vec<PowderAlertState>, sqlx::Error> {
        sqlx::query_as::<_, PowderAlertState>(
            "SELECT p.id, p.reference, p.name, p.stock_kg, p.alert_threshold_kg, \
                    a.id AS open_alert_id \
             FROM powders p \
             LEFT JOIN stock_alerts a ON a.powder_id = p.id AND a.resolved_at IS NULL \
             WHERE p.tenant_id = $1 \
             ORDER BY p.reference",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    /// Open an alert unless one is already open for the powder.
    pub async fn open_alert(
        conn: &mut PgConnection,
        tenant_id: DbId,
        powder_id: DbId,
        stock_kg: f64,
        threshold_kg: f64,
    ) -> Result<Option<StockAlert>, sqlx::Error> {
        let query = format!(
            "INSERT INTO stock_alerts (tenant_id, powder_id, stock_kg, threshold_kg) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (powder_id) WHERE resolved_at IS NULL DO NOTHING \
             RETURNING {ALERT_COLUMNS}"
        );
        sqlx::query_as::<_, StockAlert>(&query)
            .bind(tenant_id)
            .bind(powder_id)
            .bind(stock_kg)
            .bind(threshold_kg)
            .fetch_optional(conn)
            .await
    }

    pub async fn resolve_alert(
        conn: &mut PgConnection,
        tenant_id: DbId,
        alert_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE stock_alerts SET resolved_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND resolved_at IS NULL",
        )
        .bind(tenant_id)
        .bind(alert_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of consumption movements recorded for a project.
    pub async fn count_consumptions(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM stock_movements \
             WHERE tenant_id = $1 AND project_id = $2 AND reason = $3",
        )
        .bind(tenant_id)
        .bind(project_id)
        .bind(movement_reasons::CONSUMPTION)
        .fetch_one(pool)
        .await
    }
}
