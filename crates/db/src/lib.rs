//! Postgres persistence for the atelier backend.
//!
//! - [`models`]: row structs and DTOs.
//! - [`repositories`]: zero-sized repository structs with async queries.
//! - [`automation`]: transactional execution of status changes, quote
//!   signatures and payments.
//! - [`jobs`]: externally triggered maintenance jobs.

use sqlx::postgres::PgPoolOptions;

pub mod automation;
pub mod jobs;
pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
