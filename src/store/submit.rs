//! Bulk submission with bounded retry.
//!
//! [`submit_batch`] attempts to write one planned batch and accounts for
//! every item. Transient rejections are retried by resubmitting the rejected
//! subset only; a transport-level bulk failure degrades to per-document
//! submission so malformed items can be told apart from a systemic outage.

use super::{DocumentStore, StoreError, WriteOutcome};
use crate::batch::BatchItem;
use log::{debug, warn};
use std::collections::HashMap;

/// Bounded retry policy for transient bulk rejections.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total bulk attempts per batch, including the first.
    pub max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Accounting for one submitted batch: `accepted + rejected == attempted`.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub attempted: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// (item index within the batch, last observed rejection reason)
    pub failures: Vec<(usize, String)>,
}

impl BatchResult {
    fn record_rejected(&mut self, item_index: usize, reason: String) {
        self.rejected += 1;
        self.failures.push((item_index, reason));
    }

    pub fn is_balanced(&self) -> bool {
        self.accepted + self.rejected == self.attempted
    }

    /// Result for a batch the store never acknowledged.
    pub fn all_rejected(attempted: usize, reason: &str) -> Self {
        BatchResult {
            attempted,
            accepted: 0,
            rejected: attempted,
            failures: (0..attempted).map(|i| (i, reason.to_string())).collect(),
        }
    }
}

/// Submit one batch, retrying transient rejections.
///
/// Never errors on partial failure; the only `Err` is total unavailability
/// of the store, established when both the bulk call and the degraded
/// per-document probe fail at the transport level.
pub async fn submit_batch<S: DocumentStore>(
    store: &S,
    index: &str,
    items: &[BatchItem],
    policy: &RetryPolicy,
) -> Result<BatchResult, StoreError> {
    let mut result = BatchResult {
        attempted: items.len(),
        ..BatchResult::default()
    };
    if items.is_empty() {
        return Ok(result);
    }

    let max_attempts = policy.max_attempts.max(1);

    // Indices into `items` still awaiting a final outcome.
    let mut pending: Vec<usize> = (0..items.len()).collect();
    let mut last_reasons: HashMap<usize, String> = HashMap::new();

    for attempt in 1..=max_attempts {
        let subset: Vec<BatchItem> = pending.iter().map(|&i| items[i].clone()).collect();

        let outcomes = match store.bulk_write(index, &subset).await {
            Ok(outcomes) => outcomes,
            Err(err) if attempt == 1 => {
                warn!(
                    "{index}: bulk write failed ({err}), falling back to per-document submission"
                );
                return submit_one_by_one(store, index, items).await;
            }
            Err(err) => {
                // Outage during a retry: the items already resolved keep
                // their outcomes; everything still pending is rejected with
                // its last known reason.
                warn!("{index}: bulk retry attempt {attempt} failed: {err}");
                for &item_index in &pending {
                    let reason = last_reasons
                        .remove(&item_index)
                        .unwrap_or_else(|| format!("store unreachable: {err}"));
                    result.record_rejected(item_index, reason);
                }
                return Ok(result);
            }
        };

        if outcomes.len() != subset.len() {
            return Err(StoreError::ItemCountMismatch {
                sent: subset.len(),
                got: outcomes.len(),
            });
        }

        let mut retry = Vec::new();
        for (&item_index, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                WriteOutcome::Accepted => result.accepted += 1,
                WriteOutcome::Rejected { reason, transient } => {
                    if transient && attempt < max_attempts {
                        last_reasons.insert(item_index, reason);
                        retry.push(item_index);
                    } else {
                        result.record_rejected(item_index, reason);
                    }
                }
            }
        }

        if retry.is_empty() {
            break;
        }
        debug!(
            "{index}: retrying {} transient rejections (attempt {} of {max_attempts})",
            retry.len(),
            attempt + 1
        );
        pending = retry;
    }

    debug_assert!(result.is_balanced());
    Ok(result)
}

/// Degraded path: write documents one at a time to isolate malformed items
/// from a systemic outage.
async fn submit_one_by_one<S: DocumentStore>(
    store: &S,
    index: &str,
    items: &[BatchItem],
) -> Result<BatchResult, StoreError> {
    let mut result = BatchResult {
        attempted: items.len(),
        ..BatchResult::default()
    };
    let mut delivered_any = false;

    let mut idx = 0;
    while idx < items.len() {
        match store
            .bulk_write(index, std::slice::from_ref(&items[idx]))
            .await
        {
            Ok(outcomes) => {
                delivered_any = true;
                match outcomes.into_iter().next() {
                    Some(WriteOutcome::Accepted) => result.accepted += 1,
                    Some(WriteOutcome::Rejected { reason, .. }) => {
                        result.record_rejected(idx, reason);
                    }
                    None => result.record_rejected(idx, "store returned no outcome".to_string()),
                }
            }
            Err(err) if !delivered_any => {
                // The probe failed too: the store is down, not the batch.
                return Err(err);
            }
            Err(err) => {
                warn!("{index}: store became unreachable during per-document submission: {err}");
                let reason = format!("store unreachable: {err}");
                for rest in idx..items.len() {
                    result.record_rejected(rest, reason.clone());
                }
                break;
            }
        }
        idx += 1;
    }

    debug_assert!(result.is_balanced());
    Ok(result)
}
