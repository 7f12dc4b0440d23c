use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 1000;

/// One row of `tsa_responses`. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredRecord {
    pub id: Option<i64>,
    pub item: String,
    pub check_in: bool,
    pub carry_on: bool,
    pub description: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Accepts RFC 3339 timestamps and the offset-less form PostgREST emits for
/// `timestamp` columns, which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(serde::de::Error::custom)
}

/// Insert payload; field names match the table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecord {
    pub item: String,
    pub check_in: bool,
    pub carry_on: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordFilter {
    pub item: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl RecordFilter {
    pub fn new(item: Option<String>, limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            item,
            limit: limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}
