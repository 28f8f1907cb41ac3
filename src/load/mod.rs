//! Schema-forced loading of raw files into in-memory tables.
//!
//! A load either yields a fully-materialized [`Table`] or an explicit
//! [`LoadError`]; there is no null-table sentinel for callers to forget to
//! check. The orchestrator decides what a failed load means for the rest of
//! the run.

mod compression;
mod delimited;
mod json;

use std::path::Path;
use std::time::Instant;

use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use bytes::Bytes;
use snafu::prelude::*;
use tracing::debug;

use crate::config::{SourceConfig, SourceFormat};
use crate::error::{LoadError, MissingFileSnafu, ReadFileSnafu};

pub use compression::{CompressionCodec, DecompressionError, GzipCodec, NoopCodec};

/// An immutable tabular snapshot: a declared schema plus record batches.
///
/// Produced by one stage, consumed by the next; never updated in place.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl Table {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// Total row count across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

/// Load a raw file into a [`Table`] typed by `schema`.
///
/// Dispatches on the configured format and decompresses through the
/// configured codec. The file must exist; for archive sources the caller
/// passes the extracted member path, so a bad archive surfaces here as
/// [`LoadError::MissingFile`] rather than as a crash downstream.
pub fn load(
    path: &Path,
    source: &SourceConfig,
    schema: SchemaRef,
    batch_size: usize,
) -> Result<Table, LoadError> {
    ensure!(
        path.exists(),
        MissingFileSnafu {
            path: path.display().to_string(),
        }
    );

    let start = Instant::now();
    let data = Bytes::from(std::fs::read(path).context(ReadFileSnafu {
        path: path.display().to_string(),
    })?);

    let codec = source.compression.codec();
    let reader = codec
        .create_reader(data.as_ref())
        .map_err(|e| LoadError::Decompression {
            path: path.display().to_string(),
            message: e.message,
        })?;

    let table = match source.format {
        SourceFormat::Json => json::read_ndjson(reader, schema, batch_size, path)?,
        SourceFormat::Csv => {
            delimited::read_delimited(reader, schema, source.has_header, batch_size, path)?
        }
    };

    debug!(
        rows = table.num_rows(),
        batches = table.batches.len(),
        codec = codec.name(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded {}",
        path.display()
    );
    Ok(table)
}
