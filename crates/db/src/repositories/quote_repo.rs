//! Repository for the `quotes` table.

use atelier_core::signing::SignatureMethod;
use atelier_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::quote::{Quote, QUOTE_STATUS_ACCEPTED};

const COLUMNS: &str = "\
    id, tenant_id, numero, client_id, powder_id, status, items, total_ht_cents, \
    total_tva_cents, total_ttc_cents, estimated_consumption_kg, valid_until, \
    signed_at, signed_by, signer_name, signature_method, created_at, updated_at";

/// Provides queries and the signing update for quotes.
pub struct QuoteRepo;

impl QuoteRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Quote>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM quotes WHERE tenant_id = $1 AND id = $2");
        sqlx::query_as::<_, Quote>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a quote and lock its row until the surrounding transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Quote>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM quotes WHERE tenant_id = $1 AND id = $2 FOR UPDATE");
        sqlx::query_as::<_, Quote>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Record the signature and move the quote to `accepte`.
    pub async fn mark_signed(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
        signed_by: Option<DbId>,
        signer_name: &str,
        method: SignatureMethod,
    ) -> Result<Quote, sqlx::Error> {
        let query = format!(
            "UPDATE quotes SET \
                signed_at = NOW(), signed_by = $3, signer_name = $4, \
                signature_method = $5, status = $6, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Quote>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(signed_by)
            .bind(signer_name)
            .bind(method.as_str())
            .bind(QUOTE_STATUS_ACCEPTED)
            .fetch_one(conn)
            .await
    }

    /// Totals of the accepted quote a project was created from, if any.
    pub async fn accepted_totals(
        conn: &mut PgConnection,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<(i64, i64, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT total_ht_cents, total_tva_cents, total_ttc_cents FROM quotes \
             WHERE tenant_id = $1 AND id = $2 AND status = $3",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(QUOTE_STATUS_ACCEPTED)
        .fetch_optional(conn)
        .await
    }
}
