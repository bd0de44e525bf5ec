//! Meridian persistence layer
//!
//! PostgreSQL pool setup, schema migrations, the product and BOM edge
//! repositories, and the Postgres-backed [`PgBomStore`].

pub mod bom_store;
pub mod migrations;
pub mod postgres;
pub mod repositories;

pub use bom_store::{PgBomStore, BOM_GRAPH_LOCK_KEY};
pub use postgres::{create_postgres_pool, health_check as postgres_health_check, PostgresPool};
pub use repositories::*;

use anyhow::Result;
use meridian_utils::DatabaseConfig;
use std::time::Duration;

pub async fn initialize_database(config: &DatabaseConfig) -> Result<PostgresPool> {
    let pool = create_postgres_pool(
        &config.postgres_url,
        config.max_connections,
        Duration::from_secs(config.connection_timeout_seconds),
    )
    .await?;

    migrations::run_postgres_migrations(&pool).await?;

    Ok(pool)
}
