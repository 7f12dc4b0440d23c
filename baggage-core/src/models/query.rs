use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Inbound body for `POST /check-item`. A missing `item` is treated the same
/// as an empty one so callers get a 400 rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRequest {
    #[serde(default)]
    pub item: String,
}

/// A validated, trimmed item name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    item: String,
}

impl ItemQuery {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let item = raw.trim();
        if item.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Item name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            item: item.to_string(),
        })
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn into_item(self) -> String {
        self.item
    }
}
