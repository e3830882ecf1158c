//! HTTP handlers, one module per resource.

pub mod audit;
pub mod exports;
pub mod invoices;
pub mod jobs;
pub mod notifications;
pub mod numeros;
pub mod projects;
pub mod quotes;
