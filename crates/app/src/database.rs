//! Database connection management

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions, raw_sql};

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

/// Builds a `PostgreSQL` pool without connecting.
///
/// Connections are opened on first use, so an unreachable database degrades
/// replication instead of blocking start-up.
///
/// # Errors
///
/// Returns an error if the connection string can't be parsed.
pub fn connect_lazy(database_url: &str, acquire_timeout: Duration) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Creates the `carts` table and its change trigger if missing.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    raw_sql(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}
