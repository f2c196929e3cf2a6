//! CSV source reading.
//!
//! The census exports are encoded in a single-byte Latin character set
//! (Windows-1252), so the reader decodes the whole file before handing it to
//! the CSV parser. Rows that fail to parse are dropped with a logged reason;
//! only a missing or headerless file fails the table.

use encoding_rs::WINDOWS_1252;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse header of {path}: {source}")]
    Header { path: PathBuf, source: csv::Error },
    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },
}

/// One raw row, keyed by column name. Consumed immediately by the
/// normalizer and never retained.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    values: HashMap<String, String>,
}

impl RawRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for RawRecord {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        RawRecord {
            values: iter.into_iter().collect(),
        }
    }
}

/// Read every well-formed row of `path`.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
    if had_errors {
        log::warn!(
            "{}: replacement characters emitted during Windows-1252 decode",
            path.display()
        );
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(decoded.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| SourceError::Header {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(SourceError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (row, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                records.push(
                    headers
                        .iter()
                        .enumerate()
                        .map(|(idx, header)| {
                            (header.clone(), record.get(idx).unwrap_or("").to_string())
                        })
                        .collect(),
                );
            }
            Err(err) => {
                dropped += 1;
                // +2: one for the header line, one for 1-based numbering
                log::warn!("{}: dropping row {}: {}", path.display(), row + 2, err);
            }
        }
    }

    if dropped > 0 {
        log::warn!("{}: dropped {} malformed rows", path.display(), dropped);
    }
    log::info!("{}: read {} records", path.display(), records.len());

    Ok(records)
}
