//! Repository for the `audit_logs` table.
//!
//! Entries are append-only and hash-chained per tenant.

use atelier_core::audit::{self, ChainPayload};
use atelier_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, seq, tenant_id, actor_id, action_type, entity_type, entity_id, \
    details_json, integrity_hash, created_at";

// ---------------------------------------------------------------------------
// AuditLogRepo
// ---------------------------------------------------------------------------

/// Provides insert, query and retention operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append an entry to the tenant's chain.
    ///
    /// Sensitive keys in `details_json` are redacted before hashing. A
    /// transaction-scoped advisory lock serializes writers of the same tenant
    /// so two entries never chain to the same predecessor.
    pub async fn insert(
        conn: &mut PgConnection,
        tenant_id: DbId,
        entry: &CreateAuditLog,
    ) -> Result<AuditLog, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(tenant_id)
            .execute(&mut *conn)
            .await?;

        let latest = sqlx::query_scalar::<_, String>(
            "SELECT integrity_hash FROM audit_logs WHERE tenant_id = $1 ORDER BY seq DESC LIMIT 1",
        )
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;
        let prev_hash = match latest {
            Some(hash) => Some(hash),
            None => Self::checkpoint_hash(&mut *conn, tenant_id).await?,
        };

        let details = audit::redact_sensitive_fields(&entry.details_json);
        let payload = ChainPayload {
            tenant_id,
            actor_id: entry.actor_id,
            action: entry.action_type,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            details: &details,
        };
        let hash = audit::compute_integrity_hash(prev_hash.as_deref(), &payload.canonical());

        let query = format!(
            "INSERT INTO audit_logs \
                (tenant_id, actor_id, action_type, entity_type, entity_id, details_json, integrity_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(tenant_id)
            .bind(entry.actor_id)
            .bind(entry.action_type)
            .bind(entry.entity_type)
            .bind(entry.entity_id)
            .bind(&details)
            .bind(&hash)
            .fetch_one(conn)
            .await
    }

    /// Query a tenant's audit logs with filtering and pagination.
    pub async fn query(
        pool: &PgPool,
        tenant_id: DbId,
        params: &AuditQuery,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, 500);
        let offset = params.offset.unwrap_or(0).max(0);

        let (where_clause, bind_values, bind_idx) = build_audit_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs {where_clause} \
             ORDER BY seq DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = sqlx::query_as::<_, AuditLog>(&query).bind(tenant_id);
        let q = bind_audit_values(q, &bind_values);
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count audit logs matching the given filter (for pagination metadata).
    pub async fn count(
        pool: &PgPool,
        tenant_id: DbId,
        params: &AuditQuery,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_audit_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM audit_logs {where_clause}");

        let q = sqlx::query_scalar::<_, i64>(&query).bind(tenant_id);
        let q = bind_audit_values_scalar(q, &bind_values);
        q.fetch_one(pool).await
    }

    /// A tenant's entries in chain order, for integrity verification.
    pub async fn list_chain(pool: &PgPool, tenant_id: DbId) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM audit_logs WHERE tenant_id = $1 ORDER BY seq ASC");
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(tenant_id)
            .fetch_all(pool)
            .await
    }

    /// Hash of the newest purged entry, if the tenant's chain was ever purged.
    pub async fn checkpoint_hash(
        conn: &mut PgConnection,
        tenant_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT integrity_hash FROM audit_checkpoints WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(conn)
            .await
    }

    /// Delete the expired prefix of a tenant's chain. Returns the count.
    ///
    /// Only entries created before `cutoff` and older than every retained
    /// entry are removed. The hash of the newest removed entry is kept in
    /// `audit_checkpoints` so verification can anchor on it.
    pub async fn purge_older_than(
        pool: &PgPool,
        tenant_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        let boundary = sqlx::query_as::<_, (i64, String)>(
            "SELECT seq, integrity_hash FROM audit_logs \
             WHERE tenant_id = $1 AND created_at < $2 \
               AND seq < COALESCE( \
                   (SELECT MIN(seq) FROM audit_logs WHERE tenant_id = $1 AND created_at >= $2), \
                   9223372036854775807) \
             ORDER BY seq DESC LIMIT 1",
        )
        .bind(tenant_id)
        .bind(cutoff)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((seq, hash)) = boundary else {
            return Ok(0);
        };

        let deleted = sqlx::query("DELETE FROM audit_logs WHERE tenant_id = $1 AND seq <= $2")
            .bind(tenant_id)
            .bind(seq)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            "INSERT INTO audit_checkpoints (tenant_id, seq, integrity_hash, purged_total) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (tenant_id) DO UPDATE SET \
                 seq = EXCLUDED.seq, \
                 integrity_hash = EXCLUDED.integrity_hash, \
                 purged_total = audit_checkpoints.purged_total + EXCLUDED.purged_total, \
                 updated_at = NOW()",
        )
        .bind(tenant_id)
        .bind(seq)
        .bind(&hash)
        .bind(deleted as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(deleted)
    }
}

// ---------------------------------------------------------------------------
// Dynamic filter helpers
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built queries.
enum BindValue {
    Uuid(DbId),
    Text(String),
    Timestamp(Timestamp),
}

/// Build a WHERE clause and bind values from `AuditQuery` filter parameters.
///
/// `$1` is always the tenant id. Returns `(where_clause, bind_values, next_bind_index)`.
fn build_audit_filter(params: &AuditQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = vec!["tenant_id = $1".to_string()];
    let mut bind_idx = 2u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(actor_id) = params.actor_id {
        conditions.push(format!("actor_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Uuid(actor_id));
    }

    if let Some(ref action_type) = params.action_type {
        conditions.push(format!("action_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(action_type.clone()));
    }

    if let Some(ref entity_type) = params.entity_type {
        conditions.push(format!("entity_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(entity_type.clone()));
    }

    if let Some(entity_id) = params.entity_id {
        conditions.push(format!("entity_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Uuid(entity_id));
    }

    if let Some(from) = params.from {
        conditions.push(format!("created_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.to {
        conditions.push(format!("created_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    let where_clause = format!("WHERE {}", conditions.join(" AND "));
    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_audit_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Uuid(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_audit_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Uuid(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_always_scopes_by_tenant() {
        let (clause, binds, next) = build_audit_filter(&AuditQuery::default());
        assert_eq!(clause, "WHERE tenant_id = $1");
        assert!(binds.is_empty());
        assert_eq!(next, 2);
    }

    #[test]
    fn filter_numbers_placeholders_after_tenant() {
        let params = AuditQuery {
            action_type: Some("quote.sign".into()),
            entity_id: Some(DbId::nil()),
            ..AuditQuery::default()
        };
        let (clause, binds, next) = build_audit_filter(&params);
        assert_eq!(clause, "WHERE tenant_id = $1 AND action_type = $2 AND entity_id = $3");
        assert_eq!(binds.len(), 2);
        assert_eq!(next, 4);
    }
}
