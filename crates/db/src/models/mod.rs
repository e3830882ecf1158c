//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts where the API creates rows directly

pub mod audit;
pub mod invoice;
pub mod notification;
pub mod powder;
pub mod project;
pub mod quote;
pub mod tenant;
