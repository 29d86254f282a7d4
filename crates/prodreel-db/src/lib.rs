//! Postgres persistence for the ProdReel backend.
//!
//! One repository struct per table, runtime-bound queries via `query_as`.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

pub use models::{CreditBalance, NewVideoAsset, VideoAsset};
pub use repositories::{CreditRepo, VideoRepo};

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
