//! Atelier domain rules.
//!
//! Pure business logic shared by the repository layer and the HTTP API:
//! the project status machine, document numbering, automation planning,
//! invoice payment rules, stock bookkeeping, audit helpers and the FEC
//! accounting export. Nothing in this crate performs I/O.

pub mod audit;
pub mod automation;
pub mod error;
pub mod notification;
pub mod fec;
pub mod hashing;
pub mod invoice;
pub mod numbering;
pub mod project_status;
pub mod roles;
pub mod signing;
pub mod stock;
pub mod types;
