use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

use super::{RecordStore, StorageError};
use crate::config::StorageConfig;
use crate::db;
use crate::error::BaggageError;
use crate::models::{NewRecord, RecordFilter, StoredRecord};

/// Direct Postgres access to the response table.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    table: String,
    timeout: Duration,
}

impl PgRecordStore {
    /// Connect and make sure the table exists.
    pub async fn connect(config: &StorageConfig) -> Result<Self, BaggageError> {
        let pool = db::create_pool(config).await?;
        db::ensure_schema(&pool, &config.table).await?;
        tracing::info!(table = %config.table, "Postgres record store ready");
        Ok(Self::from_pool(pool, config))
    }

    pub fn from_pool(pool: PgPool, config: &StorageConfig) -> Self {
        Self {
            pool,
            table: config.table.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StorageError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: &NewRecord) -> Result<StoredRecord, StorageError> {
        let sql = format!(
            "INSERT INTO {} (item, check_in, carry_on, description) VALUES ($1, $2, $3, $4) \
             RETURNING id, item, check_in, carry_on, description, created_at",
            self.table
        );
        let query = sqlx::query_as::<_, StoredRecord>(&sql)
            .bind(&record.item)
            .bind(record.check_in)
            .bind(record.carry_on)
            .bind(&record.description)
            .fetch_one(&self.pool);

        self.bounded(query).await
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StorageError> {
        let columns = "id, item, check_in, carry_on, description, created_at";
        let limit = i64::from(filter.limit);
        let offset = i64::from(filter.offset);

        match &filter.item {
            Some(item) => {
                let sql = format!(
                    "SELECT {columns} FROM {} WHERE item = $1 \
                     ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
                    self.table
                );
                let query = sqlx::query_as::<_, StoredRecord>(&sql)
                    .bind(item)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool);
                self.bounded(query).await
            }
            None => {
                let sql = format!(
                    "SELECT {columns} FROM {} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
                    self.table
                );
                let query = sqlx::query_as::<_, StoredRecord>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool);
                self.bounded(query).await
            }
        }
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns None when no test database is reachable.
    async fn make_store() -> Option<PgRecordStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let config = StorageConfig {
            backend: crate::config::StorageBackend::Postgres,
            url: Some(url),
            table: "tsa_responses_test".to_string(),
            ..StorageConfig::default()
        };
        PgRecordStore::connect(&config).await.ok()
    }

    #[tokio::test]
    async fn test_insert_then_list_newest_first() {
        let store = match make_store().await {
            Some(s) => s,
            None => {
                eprintln!("Skipping test_insert_then_list_newest_first: DB unavailable");
                return;
            }
        };

        let item = "pg-store-test-item";
        sqlx::query("DELETE FROM tsa_responses_test WHERE item = $1")
            .bind(item)
            .execute(&store.pool)
            .await
            .ok();

        let first = store
            .insert(&NewRecord {
                item: item.to_string(),
                check_in: true,
                carry_on: false,
                description: "first".to_string(),
            })
            .await
            .unwrap();
        let second = store
            .insert(&NewRecord {
                item: item.to_string(),
                check_in: false,
                carry_on: false,
                description: "second".to_string(),
            })
            .await
            .unwrap();
        assert!(first.id.is_some());
        assert_ne!(first.id, second.id, "every insert creates a new row");

        let rows = store
            .list(&RecordFilter::new(Some(item.to_string()), None, None))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "second");

        let page = store
            .list(&RecordFilter::new(Some(item.to_string()), Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].description, "first");

        sqlx::query("DELETE FROM tsa_responses_test WHERE item = $1")
            .bind(item)
            .execute(&store.pool)
            .await
            .ok();
    }

    #[tokio::test]
    async fn test_health_check_reports_version() {
        let store = match make_store().await {
            Some(s) => s,
            None => {
                eprintln!("Skipping test_health_check_reports_version: DB unavailable");
                return;
            }
        };
        let version = db::health_check(&store.pool).await.unwrap();
        assert!(version.contains("PostgreSQL"));
    }
}
