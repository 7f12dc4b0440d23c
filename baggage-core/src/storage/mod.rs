//! Persistence of answered queries.
//!
//! `RecordStore` is implemented by a PostgREST/Supabase client (`rest`) and a
//! direct Postgres client (`postgres`). Writes are best-effort at the call
//! site; reads surface their errors.

pub mod postgres;
pub mod rest;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{BaggageError, ServiceError};
use crate::models::{NewRecord, RecordFilter, StoredRecord};

pub use postgres::PgRecordStore;
pub use rest::RestRecordStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store call timed out after {0}s")]
    Timeout(u64),

    #[error("Store returned no row for insert")]
    NoRowReturned,

    #[error("Persistence is not configured")]
    NotConfigured,
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        ServiceError::Storage(format!("Failed to read stored responses: {}", e))
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one row and return it with its store-assigned id and timestamp.
    async fn insert(&self, record: &NewRecord) -> Result<StoredRecord, StorageError>;

    /// Rows matching the filter, newest first.
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StorageError>;

    fn name(&self) -> &str;
}

/// Build the configured store. `Ok(None)` means persistence is switched off.
pub async fn create_store(
    config: &StorageConfig,
) -> Result<Option<Arc<dyn RecordStore>>, BaggageError> {
    match config.backend {
        StorageBackend::Rest => {
            let store: Arc<dyn RecordStore> = Arc::new(RestRecordStore::new(config)?);
            Ok(Some(store))
        }
        StorageBackend::Postgres => {
            let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::connect(config).await?);
            Ok(Some(store))
        }
        StorageBackend::Disabled => Ok(None),
    }
}
