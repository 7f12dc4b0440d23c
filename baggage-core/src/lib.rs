pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod storage;

pub use completion::{CompletionBackend, CompletionError, OpenRouterClient};
pub use config::{BaggageConfig, StorageBackend};
pub use error::{BaggageError, ServiceError};
pub use models::{
    CheckResponse, CompletionFields, CompletionOutcome, CompletionResult, ItemQuery, ItemRequest,
    NewRecord, RecordFilter, StoredRecord,
};
pub use storage::{create_store, RecordStore, StorageError};
