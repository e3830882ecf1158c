//! Repository for the `tenants` and `tenant_members` tables.

use atelier_core::roles::{ROLE_ADMIN, ROLE_OWNER};
use atelier_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::tenant::Tenant;

const COLUMNS: &str =
    "id, name, siren, invoice_trigger_status, payment_terms_days, created_at, updated_at";

/// Provides read access to tenant settings and membership.
pub struct TenantRepo;

impl TenantRepo {
    /// Find a tenant by ID on an open connection (usually a transaction).
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Tenant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tenants WHERE id = $1");
        sqlx::query_as::<_, Tenant>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Email addresses of the tenant's owners and admins.
    pub async fn privileged_emails(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT email FROM tenant_members \
             WHERE tenant_id = $1 AND role IN ($2, $3) AND email IS NOT NULL \
             ORDER BY created_at",
        )
        .bind(tenant_id)
        .bind(ROLE_OWNER)
        .bind(ROLE_ADMIN)
        .fetch_all(pool)
        .await
    }

    /// The tenant's SIREN, used to name accounting exports.
    pub async fn siren(pool: &PgPool, tenant_id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>("SELECT siren FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
            .map(Option::flatten)
    }
}
