//! Per-item result aggregation for bulk operations.

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// Terminal outcome of one item in a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    /// The item's name as supplied (the local file name for bulk uploads).
    pub input_name: String,
    /// Storage key written, on success.
    pub resulting_key: Option<String>,
    /// What went wrong, on failure.
    pub error_description: Option<String>,
}

impl BulkResult {
    /// A successful item.
    #[must_use]
    pub fn success(input_name: impl Into<String>, resulting_key: impl Into<String>) -> Self {
        Self {
            input_name: input_name.into(),
            resulting_key: Some(resulting_key.into()),
            error_description: None,
        }
    }

    /// A failed item.
    #[must_use]
    pub fn failure(input_name: impl Into<String>, error_description: impl Into<String>) -> Self {
        Self {
            input_name: input_name.into(),
            resulting_key: None,
            error_description: Some(error_description.into()),
        }
    }

    /// Whether the item succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.resulting_key.is_some()
    }
}

/// Aggregated results of a bulk operation, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// One entry per input item.
    pub results: Vec<BulkResult>,
}

impl BulkReport {
    /// Number of successful items.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of failed items.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Turn per-item outcomes into [`BulkResult`]s.
///
/// Input order is preserved; nothing is deduplicated or regrouped by outcome.
pub fn aggregate<I>(outcomes: I) -> BulkReport
where
    I: IntoIterator<Item = (String, Result<String, ResourceError>)>,
{
    let results = outcomes
        .into_iter()
        .map(|(name, outcome)| match outcome {
            Ok(key) => BulkResult::success(name, key),
            Err(err) => BulkResult::failure(name, err.to_string()),
        })
        .collect();
    BulkReport { results }
}
