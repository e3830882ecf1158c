//! Audit log entity models and DTOs.
//!
//! Audit logs have no `updated_at` field (immutable records).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use atelier_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Audit log entity
// ---------------------------------------------------------------------------

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub seq: i64,
    pub tenant_id: DbId,
    pub actor_id: Option<DbId>,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: DbId,
    pub details_json: serde_json::Value,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for inserting a new audit log entry. The integrity hash is computed
/// by the repository.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub actor_id: Option<DbId>,
    pub action_type: &'static str,
    pub entity_type: &'static str,
    pub entity_id: DbId,
    pub details_json: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Filter parameters for querying audit logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub actor_id: Option<DbId>,
    pub action_type: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated audit log response.
#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}
