//! Partial-failure batches.
//!
//! Every item runs concurrently on the current task and the batch completes
//! only once all items have settled. A failing item is recorded next to its
//! id; it never aborts or rolls back the others.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResult<T> {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    /// Item order is not significant.
    pub items: Vec<BulkItem<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItem<T> {
    pub id: String,
    #[serde(flatten)]
    pub outcome: BulkOutcome<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkOutcome<T> {
    Succeeded { value: T },
    Failed { error: String },
}

impl<T> BulkResult<T> {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            BulkOutcome::Failed { error } => Some((item.id.as_str(), error.as_str())),
            BulkOutcome::Succeeded { .. } => None,
        })
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

/// Run `op` for every distinct id and collect per-item outcomes.
pub async fn settle_all<T, E, F, Fut>(ids: impl IntoIterator<Item = String>, op: F) -> BulkResult<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut seen = HashSet::new();
    let unique: Vec<String> = ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let settled = join_all(unique.into_iter().map(|id| {
        let pending = op(id.clone());
        async move { (id, pending.await) }
    }))
    .await;

    let mut result = BulkResult {
        successful: 0,
        failed: 0,
        total: settled.len(),
        items: Vec::with_capacity(settled.len()),
    };

    for (id, outcome) in settled {
        let outcome = match outcome {
            Ok(value) => {
                result.successful += 1;
                BulkOutcome::Succeeded { value }
            }
            Err(e) => {
                tracing::warn!("Bulk item {} failed: {}", id, e);
                result.failed += 1;
                BulkOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        result.items.push(BulkItem { id, outcome });
    }

    tracing::info!(
        "Bulk operation settled: {}/{} succeeded, {} failed",
        result.successful,
        result.total,
        result.failed
    );

    result
}
