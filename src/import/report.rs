//! Run accounting and the final report.
//!
//! The report is a plain value owned by the orchestrator: batch results are
//! folded into it as they arrive, and nothing else mutates it.

use crate::store::submit::BatchResult;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::time::Duration;

/// Terminal state of one table's import.
#[derive(Debug, Clone, PartialEq)]
pub enum TableStatus {
    /// All rows consumed, nothing rejected.
    Complete,
    /// All rows consumed, some documents rejected.
    Partial,
    /// The table never streamed (schema or source failure).
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct TableReport {
    pub index: String,
    pub status: TableStatus,
    pub rows_read: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub elapsed: Duration,
    /// Final document count in the store, when the lookup succeeded.
    pub store_count: Option<u64>,
}

impl TableReport {
    pub(crate) fn new(index: &str) -> Self {
        TableReport {
            index: index.to_string(),
            status: TableStatus::Complete,
            rows_read: 0,
            accepted: 0,
            rejected: 0,
            elapsed: Duration::ZERO,
            store_count: None,
        }
    }

    pub(crate) fn failed(index: &str, reason: String, elapsed: Duration) -> Self {
        TableReport {
            status: TableStatus::Failed { reason },
            elapsed,
            ..TableReport::new(index)
        }
    }

    /// Fold one batch's accounting into the running totals.
    pub(crate) fn fold(&mut self, result: &BatchResult) {
        self.accepted += result.accepted;
        self.rejected += result.rejected;
    }
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
    pub elapsed: Duration,
}

impl ImportReport {
    pub fn new() -> Self {
        ImportReport {
            started_at: Utc::now(),
            tables: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn total_accepted(&self) -> usize {
        self.tables.iter().map(|table| table.accepted).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.tables.iter().map(|table| table.rejected).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.tables
            .iter()
            .any(|table| matches!(table.status, TableStatus::Failed { .. }))
    }

    /// Log the end-of-run summary block.
    pub fn log_summary(&self) {
        let divider = "=".repeat(60);
        info!("{divider}");
        info!(
            "import finished in {:.2}s (started {})",
            self.elapsed.as_secs_f64(),
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        info!("total documents indexed: {}", self.total_accepted());
        info!("total errors: {}", self.total_rejected());

        for table in &self.tables {
            let count = table
                .store_count
                .map(|count| count.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            match &table.status {
                TableStatus::Complete => info!(
                    "{}: COMPLETE rows={} accepted={} rejected=0 store_count={count}",
                    table.index, table.rows_read, table.accepted
                ),
                TableStatus::Partial => warn!(
                    "{}: PARTIAL rows={} accepted={} rejected={} store_count={count}",
                    table.index, table.rows_read, table.accepted, table.rejected
                ),
                TableStatus::Failed { reason } => {
                    warn!("{}: FAILED ({reason}) store_count={count}", table.index)
                }
            }
        }
        info!("{divider}");
    }
}

impl Default for ImportReport {
    fn default() -> Self {
        Self::new()
    }
}
