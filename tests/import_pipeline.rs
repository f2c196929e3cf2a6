//! End-to-end pipeline tests against an in-memory document store.

use eceg_loader::batch::BatchItem;
use eceg_loader::config::TableConfig;
use eceg_loader::import::report::TableStatus;
use eceg_loader::import::run_import;
use eceg_loader::schema::{TableSpec, integer, keyword, text};
use eceg_loader::store::submit::RetryPolicy;
use eceg_loader::store::{DocumentStore, StoreError, WriteOutcome};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Upsert-by-id store: identified documents overwrite, anonymous documents
/// accumulate.
#[derive(Default)]
struct MemoryStore {
    state: Mutex<HashMap<String, MemoryIndex>>,
    fail_creation_for: Option<&'static str>,
}

#[derive(Default)]
struct MemoryIndex {
    by_id: HashMap<String, serde_json::Value>,
    anonymous: Vec<serde_json::Value>,
}

impl MemoryStore {
    fn failing_creation_for(index: &'static str) -> Self {
        MemoryStore {
            fail_creation_for: Some(index),
            ..MemoryStore::default()
        }
    }

    fn document(&self, index: &str, id: &str) -> Option<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .get(index)
            .and_then(|idx| idx.by_id.get(id).cloned())
    }
}

impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().unwrap().contains_key(index))
    }

    async fn create_index(&self, spec: &TableSpec) -> Result<(), StoreError> {
        if self.fail_creation_for == Some(spec.index.as_str()) {
            return Err(StoreError::Status {
                status: StatusCode::FORBIDDEN,
                body: "blocked by cluster settings".to_string(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .entry(spec.index.clone())
            .or_default();
        Ok(())
    }

    async fn bulk_write(
        &self,
        index: &str,
        items: &[BatchItem],
    ) -> Result<Vec<WriteOutcome>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let target = state.entry(index.to_string()).or_default();

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let value = serde_json::to_value(&item.document)?;
            match &item.id {
                Some(id) => {
                    target.by_id.insert(id.clone(), value);
                }
                None => target.anonymous.push(value),
            }
            outcomes.push(WriteOutcome::Accepted);
        }
        Ok(outcomes)
    }

    async fn count(&self, index: &str) -> Result<u64, StoreError> {
        let state = self.state.lock().unwrap();
        let target = state.get(index).ok_or(StoreError::Status {
            status: StatusCode::NOT_FOUND,
            body: "index_not_found_exception".to_string(),
        })?;
        Ok((target.by_id.len() + target.anonymous.len()) as u64)
    }
}

fn place_spec(index: &str, id_field: Option<&str>) -> TableSpec {
    TableSpec {
        index: index.to_string(),
        fields: vec![keyword("CLAVE"), text("NOMBRE"), integer("POBTOT")],
        id_field: id_field.map(str::to_string),
    }
}

fn write_csv(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const THREE_ROWS: &[u8] = b"CLAVE,NOMBRE,POBTOT\n001,Centro,120\n002,Norte,\n003,Sur,95\n";

#[tokio::test]
async fn three_row_import_with_absent_integer() {
    let dir = tempfile::tempdir().unwrap();
    let table = TableConfig {
        spec: place_spec("places", Some("CLAVE")),
        path: write_csv(&dir, "places.csv", THREE_ROWS),
        batch_size: 2,
    };
    let store = MemoryStore::default();

    let report = run_import(&store, &[table], &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(report.tables.len(), 1);
    let table_report = &report.tables[0];
    assert_eq!(table_report.status, TableStatus::Complete);
    assert_eq!(table_report.rows_read, 3);
    assert_eq!(table_report.accepted, 3);
    assert_eq!(table_report.rejected, 0);
    assert_eq!(table_report.store_count, Some(3));

    // Row 2's empty integer cell was normalized to an explicit null.
    let row2 = store.document("places", "002").unwrap();
    assert!(row2["POBTOT"].is_null());
    assert_eq!(row2["NOMBRE"], serde_json::json!("Norte"));
}

#[tokio::test]
async fn failed_index_creation_skips_the_table_only() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = TableConfig {
        spec: place_spec("blocked", Some("CLAVE")),
        path: write_csv(&dir, "blocked.csv", THREE_ROWS),
        batch_size: 2,
    };
    let healthy = TableConfig {
        spec: place_spec("healthy", Some("CLAVE")),
        path: write_csv(&dir, "healthy.csv", THREE_ROWS),
        batch_size: 2,
    };
    let store = MemoryStore::failing_creation_for("blocked");

    let report = run_import(&store, &[blocked, healthy], &RetryPolicy::default())
        .await
        .unwrap();

    let first = &report.tables[0];
    assert!(matches!(first.status, TableStatus::Failed { .. }));
    assert_eq!(first.rows_read, 0);
    assert_eq!(first.accepted, 0);
    assert_eq!(first.rejected, 0);
    assert_eq!(first.store_count, None);

    // The failure did not block the next table.
    let second = &report.tables[1];
    assert_eq!(second.status, TableStatus::Complete);
    assert_eq!(second.accepted, 3);
    assert!(report.has_failures());
}

#[tokio::test]
async fn missing_source_file_marks_the_table_failed() {
    let dir = tempfile::tempdir().unwrap();
    let table = TableConfig {
        spec: place_spec("places", Some("CLAVE")),
        path: dir.path().join("does-not-exist.csv"),
        batch_size: 2,
    };
    let store = MemoryStore::default();

    let report = run_import(&store, &[table], &RetryPolicy::default())
        .await
        .unwrap();

    let table_report = &report.tables[0];
    assert!(matches!(
        table_report.status,
        TableStatus::Failed { ref reason } if reason.contains("source failure")
    ));
    // The index was created before the source failed, so the count lookup
    // still resolves.
    assert_eq!(table_report.store_count, Some(0));
}

#[tokio::test]
async fn resubmission_with_ids_is_an_upsert() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "places.csv", THREE_ROWS);
    let store = MemoryStore::default();

    for _ in 0..2 {
        let table = TableConfig {
            spec: place_spec("places", Some("CLAVE")),
            path: path.clone(),
            batch_size: 2,
        };
        let report = run_import(&store, &[table], &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(report.tables[0].store_count, Some(3));
    }
}

#[tokio::test]
async fn resubmission_without_ids_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "places.csv", THREE_ROWS);
    let store = MemoryStore::default();

    let mut counts = Vec::new();
    for _ in 0..2 {
        let table = TableConfig {
            spec: place_spec("places", None),
            path: path.clone(),
            batch_size: 2,
        };
        let report = run_import(&store, &[table], &RetryPolicy::default())
            .await
            .unwrap();
        counts.push(report.tables[0].store_count);
    }

    // Without external ids the store assigns fresh ids every run.
    assert_eq!(counts, vec![Some(3), Some(6)]);
}

#[tokio::test]
async fn latin1_descriptions_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    // 0xD1 is 'Ñ' in Windows-1252
    let path = write_csv(
        &dir,
        "latin.csv",
        b"CLAVE,NOMBRE,POBTOT\n001,CA\xD1ADA,10\n",
    );
    let table = TableConfig {
        spec: place_spec("places", Some("CLAVE")),
        path,
        batch_size: 10,
    };
    let store = MemoryStore::default();

    run_import(&store, &[table], &RetryPolicy::default())
        .await
        .unwrap();

    let doc = store.document("places", "001").unwrap();
    assert_eq!(doc["NOMBRE"], serde_json::json!("CAÑADA"));
}
