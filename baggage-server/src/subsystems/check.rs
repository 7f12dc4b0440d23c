//! Check subsystem — answers one item query.
//!
//! Validate, ask the completion backend, persist best-effort, assemble.
//! The two outbound calls run sequentially because the stored row depends
//! on the completion result.

use baggage_core::completion::CompletionBackend;
use baggage_core::error::ServiceError;
use baggage_core::models::{CheckResponse, CompletionResult, ItemQuery, NewRecord, StoredRecord};
use baggage_core::storage::{RecordStore, StorageError};

pub async fn check_item(
    completion: &dyn CompletionBackend,
    store: Option<&dyn RecordStore>,
    raw_item: &str,
) -> Result<CheckResponse, ServiceError> {
    let query = ItemQuery::parse(raw_item)?;

    let outcome = completion.complete(query.item()).await.map_err(|e| {
        tracing::error!(
            item = %query.item(),
            backend = completion.name(),
            error = %e,
            "Completion request failed"
        );
        ServiceError::from(e)
    })?;

    if outcome.is_fallback() {
        tracing::warn!(
            item = %query.item(),
            "Completion answer was not valid JSON; using conservative fallback"
        );
    }

    let result = CompletionResult::from_fields(outcome.into_fields(query.item()));

    let database_id = match store {
        Some(store) => {
            let record = NewRecord {
                item: query.item().to_string(),
                check_in: result.check_in,
                carry_on: result.carry_on,
                description: result.description.clone(),
            };
            persisted_id(store.name(), store.insert(&record).await)
        }
        None => None,
    };

    tracing::info!(
        item = %query.item(),
        check_in = result.check_in,
        carry_on = result.carry_on,
        database_id = ?database_id,
        "Item checked"
    );

    Ok(CheckResponse::assemble(query, result, database_id))
}

/// The only place a persistence write error is dropped.
fn persisted_id(backend: &str, written: Result<StoredRecord, StorageError>) -> Option<i64> {
    match written {
        Ok(record) => record.id,
        Err(e) => {
            tracing::warn!(
                backend = backend,
                error = %e,
                "Failed to store response; continuing without database id"
            );
            None
        }
    }
}
