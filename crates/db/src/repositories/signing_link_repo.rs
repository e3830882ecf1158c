//! Repository for the `quote_signing_links` table.

use atelier_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::quote::QuoteSigningLink;

const COLUMNS: &str =
    "id, tenant_id, quote_id, token_hash, expires_at, used_at, created_by, created_at";

pub struct SigningLinkRepo;

impl SigningLinkRepo {
    pub async fn create(
        conn: &mut PgConnection,
        tenant_id: DbId,
        quote_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
        created_by: DbId,
    ) -> Result<QuoteSigningLink, sqlx::Error> {
        let query = format!(
            "INSERT INTO quote_signing_links (tenant_id, quote_id, token_hash, expires_at, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuoteSigningLink>(&query)
            .bind(tenant_id)
            .bind(quote_id)
            .bind(token_hash)
            .bind(expires_at)
            .bind(created_by)
            .fetch_one(conn)
            .await
    }

    /// Resolve an unused, unexpired link by token hash and lock it.
    pub async fn find_active_for_update(
        conn: &mut PgConnection,
        token_hash: &str,
    ) -> Result<Option<QuoteSigningLink>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quote_signing_links \
             WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW() \
             FOR UPDATE"
        );
        sqlx::query_as::<_, QuoteSigningLink>(&query)
            .bind(token_hash)
            .fetch_optional(conn)
            .await
    }

    pub async fn mark_used(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE quote_signing_links SET used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
