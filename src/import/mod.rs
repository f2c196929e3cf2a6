//! Import orchestration.
//!
//! Drives catalog → normalizer → planner → submitter for every configured
//! table and folds the batch results into the run report. Tables are fully
//! independent: one table's failure never blocks the next, and only an
//! unreachable store before any work starts aborts the run.

pub mod report;

use crate::batch::plan_batches;
use crate::config::TableConfig;
use crate::normalize::normalize_record;
use crate::source::read_records;
use crate::store::submit::{BatchResult, RetryPolicy, submit_batch};
use crate::store::{DocumentStore, StoreError};
use log::{error, info, warn};
use report::{ImportReport, TableReport, TableStatus};
use std::time::Instant;

/// Rejection reasons logged per batch before summarizing the rest.
const LOGGED_FAILURES_PER_BATCH: usize = 5;

/// Run the import across every configured table.
pub async fn run_import<S: DocumentStore>(
    store: &S,
    tables: &[TableConfig],
    policy: &RetryPolicy,
) -> Result<ImportReport, StoreError> {
    store.ping().await?;
    info!("store connection established");

    let run_timer = Instant::now();
    let mut report = ImportReport::new();
    for table in tables {
        report.tables.push(import_table(store, table, policy).await);
    }
    report.elapsed = run_timer.elapsed();

    Ok(report)
}

/// Import a single table: `PENDING → SCHEMA_READY → STREAMING → terminal`.
async fn import_table<S: DocumentStore>(
    store: &S,
    table: &TableConfig,
    policy: &RetryPolicy,
) -> TableReport {
    let index = table.spec.index.as_str();
    let timer = Instant::now();
    info!("importing {index} from {}", table.path.display());

    if let Err(err) = table.spec.validate() {
        error!("{index}: invalid schema: {err}");
        return TableReport::failed(index, format!("invalid schema: {err}"), timer.elapsed());
    }

    match store.index_exists(index).await {
        Ok(true) => info!("{index}: index already exists"),
        Ok(false) => {
            // Creation still tolerates a concurrent "already exists" answer.
            if let Err(err) = store.create_index(&table.spec).await {
                error!("{index}: index creation failed: {err}");
                return TableReport::failed(
                    index,
                    format!("index creation failed: {err}"),
                    timer.elapsed(),
                );
            }
            info!("{index}: index created");
        }
        Err(err) => {
            error!("{index}: index lookup failed: {err}");
            return TableReport::failed(
                index,
                format!("index creation failed: {err}"),
                timer.elapsed(),
            );
        }
    }

    let records = match read_records(&table.path) {
        Ok(records) => records,
        Err(err) => {
            error!("{index}: source failure: {err}");
            let mut failed =
                TableReport::failed(index, format!("source failure: {err}"), timer.elapsed());
            failed.store_count = lookup_count(store, index).await;
            return failed;
        }
    };

    let mut table_report = TableReport::new(index);
    table_report.rows_read = records.len();

    let documents = records
        .iter()
        .map(|record| normalize_record(record, &table.spec));
    let batches = plan_batches(
        documents,
        index,
        table.spec.id_field.as_deref(),
        table.batch_size,
    );

    for (batch_no, batch) in batches.enumerate() {
        let result = match submit_batch(store, index, &batch, policy).await {
            Ok(result) => result,
            Err(err) => {
                warn!("{index}: batch {} undeliverable: {err}", batch_no + 1);
                BatchResult::all_rejected(batch.len(), &format!("store unreachable: {err}"))
            }
        };

        info!(
            "{index}: batch {}: indexed {} documents, {} failed",
            batch_no + 1,
            result.accepted,
            result.rejected
        );
        for (item_index, reason) in result.failures.iter().take(LOGGED_FAILURES_PER_BATCH) {
            warn!(
                "{index}: batch {} document {item_index} rejected: {reason}",
                batch_no + 1
            );
        }
        if result.failures.len() > LOGGED_FAILURES_PER_BATCH {
            warn!(
                "{index}: batch {}: {} more rejections not shown",
                batch_no + 1,
                result.failures.len() - LOGGED_FAILURES_PER_BATCH
            );
        }

        table_report.fold(&result);
    }

    table_report.status = if table_report.rejected == 0 {
        TableStatus::Complete
    } else {
        TableStatus::Partial
    };
    table_report.elapsed = timer.elapsed();
    table_report.store_count = lookup_count(store, index).await;

    info!(
        "{index}: import finished: {} accepted, {} rejected",
        table_report.accepted, table_report.rejected
    );
    table_report
}

/// Post-hoc count reconciliation; a failed lookup is recorded, not fatal.
async fn lookup_count<S: DocumentStore>(store: &S, index: &str) -> Option<u64> {
    match store.count(index).await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!("{index}: count lookup failed: {err}");
            None
        }
    }
}
