pub mod query;
pub mod record;
pub mod verdict;

pub use query::{ItemQuery, ItemRequest};
pub use record::{NewRecord, RecordFilter, StoredRecord, DEFAULT_LIMIT, MAX_LIMIT};
pub use verdict::{CheckResponse, CompletionFields, CompletionOutcome, CompletionResult};
