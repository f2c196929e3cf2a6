//! Batch planning.
//!
//! Partitions an ordered document stream into bulk batches, deriving the
//! external id for each document from the configured identifier field.

use crate::normalize::Document;

/// One document staged for a bulk write.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub document: Document,
    /// Target index.
    pub index: String,
    /// External document id; the store assigns one when unset.
    pub id: Option<String>,
}

/// Lazy iterator of batches of at most `batch_size` items.
///
/// Batches preserve source order and cover the input exactly once, so a
/// caller tracking a batch offset can restart from any batch boundary.
pub struct BatchPlanner<I> {
    documents: I,
    index: String,
    id_field: Option<String>,
    batch_size: usize,
}

/// Plan bulk batches over `documents`. A batch size below 1 is clamped to 1.
pub fn plan_batches<I>(
    documents: I,
    index: &str,
    id_field: Option<&str>,
    batch_size: usize,
) -> BatchPlanner<I::IntoIter>
where
    I: IntoIterator<Item = Document>,
{
    BatchPlanner {
        documents: documents.into_iter(),
        index: index.to_string(),
        id_field: id_field.map(str::to_string),
        batch_size: batch_size.max(1),
    }
}

impl<I: Iterator<Item = Document>> Iterator for BatchPlanner<I> {
    type Item = Vec<BatchItem>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            let Some(document) = self.documents.next() else {
                break;
            };
            let id = self
                .id_field
                .as_deref()
                .and_then(|field| document.get(field))
                .and_then(|value| value.stringify());
            batch.push(BatchItem {
                document,
                index: self.index.clone(),
                id,
            });
        }

        if batch.is_empty() { None } else { Some(batch) }
    }
}
