//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool`, or `&mut PgConnection` when they must run inside the
//! caller's transaction. Every query is scoped by tenant.

pub mod audit_repo;
pub mod invoice_repo;
pub mod notification_repo;
pub mod numbering_repo;
pub mod outbox_repo;
pub mod project_repo;
pub mod quote_repo;
pub mod signing_link_repo;
pub mod stock_repo;
pub mod tenant_repo;

pub use audit_repo::AuditLogRepo;
pub use invoice_repo::InvoiceRepo;
pub use notification_repo::NotificationRepo;
pub use numbering_repo::{NumberingRepo, NumeroRepair};
pub use outbox_repo::OutboxRepo;
pub use project_repo::ProjectRepo;
pub use quote_repo::QuoteRepo;
pub use signing_link_repo::SigningLinkRepo;
pub use stock_repo::StockRepo;
pub use tenant_repo::TenantRepo;
