//! Audit trail vocabulary, integrity chaining and snapshot redaction.
//!
//! Audit entries are append-only. Each entry stores a SHA-256 hash chained to
//! the previous entry of the same tenant so tampering breaks the chain.

use serde::Serialize;

use crate::hashing;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Action and entity names
// ---------------------------------------------------------------------------

pub mod actions {
    pub const PROJECT_STATUS_CHANGE: &str = "project.status_change";
    pub const PROJECT_AUTO_CREATE: &str = "project.auto_create";
    pub const QUOTE_SIGN: &str = "quote.sign";
    pub const QUOTE_SIGNING_LINK_CREATE: &str = "quote.signing_link_create";
    pub const INVOICE_AUTO_CREATE: &str = "invoice.auto_create";
    pub const INVOICE_PAYMENT: &str = "invoice.payment";
    pub const INVOICE_REFUND: &str = "invoice.refund";
    pub const NUMERO_REPAIR: &str = "numero.repair";
    pub const STOCK_CONSUME: &str = "stock.consume";
}

pub mod entities {
    pub const PROJECT: &str = "project";
    pub const QUOTE: &str = "quote";
    pub const INVOICE: &str = "invoice";
    pub const POWDER: &str = "powder";
    pub const DELIVERY_NOTE: &str = "delivery_note";
}

/// Default retention before the purge job removes entries (10 years).
pub const DEFAULT_RETENTION_DAYS: i64 = 3650;

// ---------------------------------------------------------------------------
// Integrity hash
// ---------------------------------------------------------------------------

/// Seed used as the "previous hash" of a tenant's first entry.
const CHAIN_SEED: &str = "ATELIER_AUDIT_CHAIN_V1";

/// Canonical content of an entry, hashed into the chain.
#[derive(Debug, Serialize)]
pub struct ChainPayload<'a> {
    pub tenant_id: DbId,
    pub actor_id: Option<DbId>,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: DbId,
    pub details: &'a serde_json::Value,
}

impl ChainPayload<'_> {
    /// Serialize to the canonical string (field order is fixed by the struct).
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Compute the integrity hash for an entry.
///
/// `prev_hash` is the hash of the tenant's previous entry, or `None` for the
/// first one.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    hashing::sha256_hex(format!("{prev}|{entry_data}").as_bytes())
}

/// A stored entry as seen by chain verification.
pub struct ChainLink<'a> {
    pub payload: ChainPayload<'a>,
    pub integrity_hash: &'a str,
}

/// Result of re-hashing a tenant's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainVerification {
    pub checked: usize,
    /// No purge checkpoint exists, so the oldest entry chains from the seed.
    pub starts_at_seed: bool,
    /// Index of the first entry whose hash does not follow its predecessor.
    pub first_broken: Option<usize>,
}

impl ChainVerification {
    pub fn is_intact(&self) -> bool {
        self.first_broken.is_none()
    }
}

/// Re-hash `links`, oldest first.
///
/// `anchor` is the hash of the last entry removed by a retention purge, or
/// `None` when the full history is retained. The oldest link must chain from
/// it, so an edit to that link is reported like any other.
pub fn verify_chain(anchor: Option<&str>, links: &[ChainLink<'_>]) -> ChainVerification {
    let mut prev = anchor;
    let first_broken = links.iter().position(|link| {
        let broken =
            compute_integrity_hash(prev, &link.payload.canonical()) != link.integrity_hash;
        prev = Some(link.integrity_hash);
        broken
    });
    ChainVerification {
        checked: links.len(),
        starts_at_seed: anchor.is_none(),
        first_broken,
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Keys whose values never reach the audit log.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "iban",
    "api_key",
    "authorization",
    "credential",
];

/// Redact sensitive keys (recursively) from a JSON snapshot.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(key, val)| {
                    let lower = key.to_lowercase();
                    if SENSITIVE_FIELDS.iter().any(|f| lower.contains(f)) {
                        (key.clone(), serde_json::Value::String("[REDACTED]".into()))
                    } else {
                        (key.clone(), redact_sensitive_fields(val))
                    }
                })
                .collect();
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

/// Build a `{ "before": ..., "after": ... }` details object.
pub fn before_after(before: serde_json::Value, after: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "before": before, "after": after })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
