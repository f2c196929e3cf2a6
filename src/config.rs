//! Loader configuration.
//!
//! Per-table configuration is static: the schema catalog supplies index
//! names, field lists, identifier fields, and source file names; the CLI
//! supplies the data directory and batch size at startup.

use crate::schema::TableSpec;
use crate::schema::catalog;
use std::path::{Path, PathBuf};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Everything the orchestrator needs to import one table.
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub spec: TableSpec,
    /// Resolved path of the source CSV file.
    pub path: PathBuf,
    pub batch_size: usize,
}

/// Join the catalog with run-level options into per-table configs.
pub fn table_configs(data_dir: &Path, batch_size: usize) -> Vec<TableConfig> {
    catalog::entries()
        .into_iter()
        .map(|entry| TableConfig {
            path: data_dir.join(entry.file_name),
            spec: entry.spec,
            batch_size: batch_size.max(1),
        })
        .collect()
}
