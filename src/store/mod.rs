//! Document store collaborator interface.
//!
//! The loader talks to the store through [`DocumentStore`] so the pipeline
//! can be exercised against in-memory implementations; [`elastic`] provides
//! the Elasticsearch client used in production.

pub mod elastic;
pub mod submit;

use crate::batch::BatchItem;
use crate::schema::TableSpec;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that occur while talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to encode bulk payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("bulk response item count mismatch: sent {sent}, got {got}")]
    ItemCountMismatch { sent: usize, got: usize },
}

/// Per-document outcome of a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Accepted,
    /// Rejected by the store; `transient` marks reasons worth retrying.
    Rejected { reason: String, transient: bool },
}

/// Operations the import pipeline needs from a document store.
///
/// `bulk_write` reports partial failure through the per-item outcomes and
/// only errors when the call itself could not be completed.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Startup reachability check.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn index_exists(&self, index: &str) -> Result<bool, StoreError>;

    /// Create the index described by `spec`; succeeds if it already exists.
    async fn create_index(&self, spec: &TableSpec) -> Result<(), StoreError>;

    /// Write every item, returning one outcome per item in input order.
    async fn bulk_write(
        &self,
        index: &str,
        items: &[BatchItem],
    ) -> Result<Vec<WriteOutcome>, StoreError>;

    async fn count(&self, index: &str) -> Result<u64, StoreError>;
}
