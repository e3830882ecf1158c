//! Document numbering: the per-tenant `document_sequences` counter and its
//! fallbacks.
//!
//! [`NumberingRepo::generate`] never fails. The primary path bumps the
//! sequence atomically, the degraded path scans existing numeros, and the
//! last resort is a timestamp-suffixed numero.

use atelier_core::numbering::{self, DocumentType};
use atelier_core::types::DbId;
use chrono::{Datelike, Utc};
use sqlx::{Connection, PgConnection, PgPool};

/// A numero rewritten by the repair job.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NumeroRepair {
    pub document_type: DocumentType,
    pub id: DbId,
    pub old_numero: String,
    pub new_numero: String,
}

pub struct NumberingRepo;

impl NumberingRepo {
    /// Generate the next numero for `doc_type` on an open connection.
    ///
    /// When called inside a transaction the counter bump rolls back with it.
    pub async fn generate(conn: &mut PgConnection, tenant_id: DbId, doc_type: DocumentType) -> String {
        let year = Utc::now().year();

        match Self::next_sequence(conn, tenant_id, doc_type, year).await {
            Ok(sequence) => return numbering::format_numero(doc_type, year, sequence),
            Err(e) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    document_type = %doc_type,
                    error = %e,
                    "Document sequence unavailable, scanning existing numeros",
                );
            }
        }

        match Self::next_from_scan(conn, tenant_id, doc_type, year).await {
            Ok(numero) => return numero,
            Err(e) => {
                tracing::error!(
                    tenant_id = %tenant_id,
                    document_type = %doc_type,
                    error = %e,
                    "Numero scan failed, using timestamp numero",
                );
            }
        }

        numbering::timestamp_numero(doc_type, year, Utc::now().timestamp_millis())
    }

    /// Generate a numero outside any transaction.
    pub async fn generate_with_pool(pool: &PgPool, tenant_id: DbId, doc_type: DocumentType) -> String {
        match pool.acquire().await {
            Ok(mut conn) => Self::generate(&mut conn, tenant_id, doc_type).await,
            Err(e) => {
                tracing::error!(error = %e, "No connection for numbering, using timestamp numero");
                numbering::timestamp_numero(doc_type, Utc::now().year(), Utc::now().timestamp_millis())
            }
        }
    }

    /// Bump and return the counter for `(tenant, type, year)`.
    ///
    /// The counter never falls behind the highest well-formed numero already
    /// stored, so rows issued before the sequence existed are skipped over.
    /// Runs in a savepoint so a failure leaves the caller's transaction usable.
    pub async fn next_sequence(
        conn: &mut PgConnection,
        tenant_id: DbId,
        doc_type: DocumentType,
        year: i32,
    ) -> Result<i64, sqlx::Error> {
        let mut savepoint = conn.begin().await?;
        let query = format!(
            "INSERT INTO document_sequences (tenant_id, document_type, year, last_value) \
             VALUES ($1, $2, $3, ( \
                SELECT COALESCE(MAX(substring(numero FROM $4)::BIGINT), 0) + 1 \
                FROM {table} WHERE tenant_id = $1 \
             )) \
             ON CONFLICT (tenant_id, document_type, year) DO UPDATE SET \
                last_value = GREATEST(document_sequences.last_value + 1, EXCLUDED.last_value), \
                updated_at = NOW() \
             RETURNING last_value",
            table = doc_type.table(),
        );
        let value = sqlx::query_scalar::<_, i64>(&query)
            .bind(tenant_id)
            .bind(doc_type.as_str())
            .bind(year)
            .bind(suffix_pattern(doc_type, year))
            .fetch_one(&mut *savepoint)
            .await?;
        savepoint.commit().await?;
        Ok(value)
    }

    /// Degraded path: max well-formed suffix among existing numeros, plus one.
    pub async fn next_from_scan(
        conn: &mut PgConnection,
        tenant_id: DbId,
        doc_type: DocumentType,
        year: i32,
    ) -> Result<String, sqlx::Error> {
        let mut savepoint = conn.begin().await?;
        let query = format!(
            "SELECT numero FROM {} WHERE tenant_id = $1 AND numero LIKE $2",
            doc_type.table()
        );
        let existing = sqlx::query_scalar::<_, String>(&query)
            .bind(tenant_id)
            .bind(format!("{}-{year}-%", doc_type.prefix()))
            .fetch_all(&mut *savepoint)
            .await?;
        savepoint.commit().await?;
        Ok(numbering::next_from_existing(
            existing.iter().map(String::as_str),
            doc_type,
            year,
        ))
    }

    /// Rows of `doc_type` whose numero is not in canonical form.
    pub async fn find_malformed(
        conn: &mut PgConnection,
        tenant_id: DbId,
        doc_type: DocumentType,
    ) -> Result<Vec<(DbId, String)>, sqlx::Error> {
        let query = format!(
            "SELECT id, numero FROM {} WHERE tenant_id = $1 ORDER BY created_at, id",
            doc_type.table()
        );
        let rows = sqlx::query_as::<_, (DbId, String)>(&query)
            .bind(tenant_id)
            .fetch_all(conn)
            .await?;
        Ok(rows
            .into_iter()
            .filter(|(_, numero)| !numbering::is_well_formed(numero, doc_type))
            .collect())
    }

    /// Overwrite one document's numero.
    pub async fn replace_numero(
        conn: &mut PgConnection,
        tenant_id: DbId,
        doc_type: DocumentType,
        id: DbId,
        numero: &str,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "UPDATE {} SET numero = $3 WHERE tenant_id = $1 AND id = $2",
            doc_type.table()
        );
        sqlx::query(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(numero)
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Postgres regex capturing the numeric suffix of a canonical numero.
fn suffix_pattern(doc_type: DocumentType, year: i32) -> String {
    format!(r"^{}-{year}-(\d{{4,18}})$", doc_type.prefix())
}
