//! Repository for the `invoices` table.

use atelier_core::invoice::{InvoiceType, PaymentStatus, Totals};
use atelier_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::invoice::{CreateInvoice, Invoice, InvoiceForExport};

const COLUMNS: &str = "\
    id, tenant_id, numero, project_id, client_id, invoice_type, payment_status, \
    total_ht_cents, total_tva_cents, total_ttc_cents, amount_paid_cents, issued_on, \
    due_date, paid_at, refunded_at, auto_created, created_at, updated_at";

/// Provides invoice creation, payment updates and export queries.
pub struct InvoiceRepo;

impl InvoiceRepo {
    pub async fn create(
        conn: &mut PgConnection,
        tenant_id: DbId,
        numero: &str,
        input: &CreateInvoice,
    ) -> Result<Invoice, sqlx::Error> {
        let query = format!(
            "INSERT INTO invoices (tenant_id, numero, project_id, client_id, invoice_type, \
                total_ht_cents, total_tva_cents, total_ttc_cents, issued_on, due_date, \
                auto_created) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(tenant_id)
            .bind(numero)
            .bind(input.project_id)
            .bind(input.client_id)
            .bind(input.invoice_type.as_str())
            .bind(input.totals.ht)
            .bind(input.totals.tva)
            .bind(input.totals.ttc)
            .bind(input.issued_on)
            .bind(input.due_date)
            .bind(input.auto_created)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE tenant_id = $1 AND id = $2");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_for_update(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invoices WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Whether the project already has its automatic balance invoice.
    pub async fn has_auto_invoice(
        conn: &mut PgConnection,
        tenant_id: DbId,
        project_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                SELECT 1 FROM invoices \
                WHERE tenant_id = $1 AND project_id = $2 \
                  AND auto_created AND invoice_type <> $3 \
             )",
        )
        .bind(tenant_id)
        .bind(project_id)
        .bind(InvoiceType::Acompte.as_str())
        .fetch_one(conn)
        .await
    }

    /// Totals of the deposit invoices already issued for a project.
    pub async fn deposit_totals(
        conn: &mut PgConnection,
        tenant_id: DbId,
        project_id: DbId,
    ) -> Result<Vec<Totals>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT total_ht_cents, total_tva_cents, total_ttc_cents FROM invoices \
             WHERE tenant_id = $1 AND project_id = $2 AND invoice_type = $3 \
             ORDER BY issued_on, created_at",
        )
        .bind(tenant_id)
        .bind(project_id)
        .bind(InvoiceType::Acompte.as_str())
        .fetch_all(conn)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(ht, tva, ttc)| Totals { ht, tva, ttc })
            .collect())
    }

    /// Store a new paid amount and payment status. Reaching `paid` stamps `paid_at`.
    pub async fn update_payment(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
        amount_paid_cents: i64,
        status: PaymentStatus,
    ) -> Result<Invoice, sqlx::Error> {
        let query = format!(
            "UPDATE invoices SET \
                amount_paid_cents = $3, \
                payment_status = $4, \
                paid_at = CASE WHEN $4 = 'paid' THEN NOW() ELSE paid_at END, \
                updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(amount_paid_cents)
            .bind(status.as_str())
            .fetch_one(conn)
            .await
    }

    pub async fn mark_refunded(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Invoice, sqlx::Error> {
        let query = format!(
            "UPDATE invoices SET payment_status = $3, refunded_at = NOW(), updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(PaymentStatus::Refunded.as_str())
            .fetch_one(conn)
            .await
    }

    /// Invoices issued during `year`, joined with their client, in numero order.
    pub async fn list_for_export(
        pool: &PgPool,
        tenant_id: DbId,
        year: i32,
    ) -> Result<Vec<InvoiceForExport>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceForExport>(
            "SELECT i.numero, i.issued_on, i.client_id, c.name AS client_name, \
                    i.total_ht_cents, i.total_tva_cents, i.total_ttc_cents \
             FROM invoices i \
             JOIN clients c ON c.id = i.client_id \
             WHERE i.tenant_id = $1 AND EXTRACT(YEAR FROM i.issued_on)::INTEGER = $2 \
             ORDER BY i.issued_on, i.numero",
        )
        .bind(tenant_id)
        .bind(year)
        .fetch_all(pool)
        .await
    }
}
