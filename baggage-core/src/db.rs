use std::time::Duration;

use crate::config::StorageConfig;
use crate::error::BaggageError;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &StorageConfig) -> Result<PgPool, BaggageError> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| BaggageError::MissingConfig("DATABASE_URL".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.timeout_seconds))
        .connect(url)
        .await?;
    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

/// Create the response table if it does not exist yet. The table name is
/// interpolated, so it must come from trusted configuration.
pub async fn ensure_schema(pool: &PgPool, table: &str) -> Result<(), sqlx::Error> {
    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id BIGSERIAL PRIMARY KEY,
            item TEXT NOT NULL,
            check_in BOOLEAN NOT NULL,
            carry_on BOOLEAN NOT NULL,
            description TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"
    );
    sqlx::query(&ddl).execute(pool).await?;

    let index = format!(
        "CREATE INDEX IF NOT EXISTS {table}_item_created_at_idx ON {table} (item, created_at DESC)"
    );
    sqlx::query(&index).execute(pool).await?;
    Ok(())
}
