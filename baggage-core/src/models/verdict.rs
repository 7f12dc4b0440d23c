use serde::{Deserialize, Serialize};

use super::query::ItemQuery;

pub const NO_INFORMATION: &str = "No information available";

/// The mapping the model returned. Keys may be missing; defaults are applied
/// when the outward response is assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionFields {
    pub check_in: Option<bool>,
    pub carry_on: Option<bool>,
    pub description: Option<String>,
}

/// Result of strictly parsing the model's text payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Parsed(CompletionFields),
    Unparsable(String),
}

impl CompletionOutcome {
    /// Strict JSON parse. Anything that is not an object with correctly typed
    /// keys lands in `Unparsable`.
    pub fn parse(content: &str) -> Self {
        let fields = match serde_json::from_str::<serde_json::Value>(content) {
            Ok(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value::<CompletionFields>(value).ok()
            }
            _ => None,
        };

        match fields {
            Some(fields) => CompletionOutcome::Parsed(fields),
            None => CompletionOutcome::Unparsable(content.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CompletionOutcome::Unparsable(_))
    }

    /// Collapse to a field mapping, substituting the conservative verdict
    /// for unparsable content.
    pub fn into_fields(self, item: &str) -> CompletionFields {
        match self {
            CompletionOutcome::Parsed(fields) => fields,
            CompletionOutcome::Unparsable(_) => CompletionResult::fallback(item).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub check_in: bool,
    pub carry_on: bool,
    pub description: String,
}

impl CompletionResult {
    /// Both allowances denied; used whenever the model's answer cannot be read.
    pub fn fallback(item: &str) -> Self {
        Self {
            check_in: false,
            carry_on: false,
            description: format!(
                "Could not parse response for {}. Please check with official TSA guidelines.",
                item
            ),
        }
    }

    pub fn from_fields(fields: CompletionFields) -> Self {
        Self {
            check_in: fields.check_in.unwrap_or(false),
            carry_on: fields.carry_on.unwrap_or(false),
            description: fields
                .description
                .unwrap_or_else(|| NO_INFORMATION.to_string()),
        }
    }
}

impl From<CompletionResult> for CompletionFields {
    fn from(result: CompletionResult) -> Self {
        Self {
            check_in: Some(result.check_in),
            carry_on: Some(result.carry_on),
            description: Some(result.description),
        }
    }
}

/// Outward response of `check-item`. `database_id` is always serialized,
/// `null` when nothing was persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub item: String,
    pub check_in: bool,
    pub carry_on: bool,
    pub description: String,
    pub database_id: Option<i64>,
}

impl CheckResponse {
    pub fn assemble(query: ItemQuery, result: CompletionResult, database_id: Option<i64>) -> Self {
        Self {
            item: query.into_item(),
            check_in: result.check_in,
            carry_on: result.carry_on,
            description: result.description,
            database_id,
        }
    }
}
