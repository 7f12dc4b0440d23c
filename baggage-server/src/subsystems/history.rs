//! History subsystem — reads previously answered queries back out.

use baggage_core::error::ServiceError;
use baggage_core::models::{RecordFilter, StoredRecord};
use baggage_core::storage::{RecordStore, StorageError};

/// Reads have no safe default, so every failure (including a missing store)
/// surfaces as `ServiceError::Storage`.
pub async fn list_stored(
    store: Option<&dyn RecordStore>,
    filter: &RecordFilter,
) -> Result<Vec<StoredRecord>, ServiceError> {
    let store = store.ok_or_else(|| ServiceError::from(StorageError::NotConfigured))?;

    store.list(filter).await.map_err(|e| {
        tracing::error!(
            backend = store.name(),
            item = ?filter.item,
            error = %e,
            "Failed to read stored responses"
        );
        ServiceError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use baggage_core::models::NewRecord;

    struct UnreachableStore;

    #[async_trait]
    impl RecordStore for UnreachableStore {
        async fn insert(&self, _record: &NewRecord) -> Result<StoredRecord, StorageError> {
            Err(StorageError::Timeout(10))
        }

        async fn list(&self, _filter: &RecordFilter) -> Result<Vec<StoredRecord>, StorageError> {
            Err(StorageError::Timeout(10))
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_storage_error() {
        let result = list_stored(Some(&UnreachableStore), &RecordFilter::default()).await;
        match result {
            Err(ServiceError::Storage(msg)) => assert!(msg.contains("timed out")),
            other => panic!("Expected Storage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_store_is_storage_error() {
        let result = list_stored(None, &RecordFilter::default()).await;
        match result {
            Err(ServiceError::Storage(msg)) => assert!(msg.contains("not configured")),
            other => panic!("Expected Storage error, got {:?}", other),
        }
    }
}
