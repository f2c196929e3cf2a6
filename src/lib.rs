//! Bulk loader for the ECEG 2020 census tables.
//!
//! Reads the delimited census exports, normalizes every row into a typed
//! document, and bulk-indexes the documents into Elasticsearch in fixed-size
//! batches. Partial failure is tracked per table and per batch and surfaces
//! in the final run report instead of aborting the pipeline.

pub mod batch;
pub mod config;
pub mod import;
pub mod normalize;
pub mod schema;
pub mod source;
pub mod store;
