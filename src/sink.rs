//! Parquet persistence.
//!
//! Each output artifact is a directory containing exactly one Parquet data
//! file, mirroring a single-partition write. Overwrite replaces the whole
//! artifact; a failed write can leave the path absent, partial, or stale,
//! which is why the orchestrator reports write failures explicitly.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use snafu::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::error::{
    CreateDirSnafu, CreateFileSnafu, FinalizeSnafu, OutputExistsSnafu, RemoveExistingSnafu,
    WriteBatchSnafu, WriteError, WriterCreateSnafu,
};
use crate::load::Table;

/// Statistics from a completed write.
#[derive(Debug, Clone, Copy)]
pub struct WriteStats {
    /// Rows written.
    pub rows: usize,
    /// Size of the data file on disk.
    pub bytes: u64,
    /// Wall-clock duration of the write.
    pub elapsed: Duration,
}

/// Persist `table` as a single-file Parquet artifact at `output_path`.
///
/// The parent directory is created if needed. With `overwrite` set, any
/// existing artifact at the path is removed first; without it, an existing
/// artifact is an error.
pub fn write(table: &Table, output_path: &Path, overwrite: bool) -> Result<WriteStats, WriteError> {
    let start = Instant::now();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                path: parent.display().to_string(),
            })?;
        }
    }

    if output_path.exists() {
        ensure!(
            overwrite,
            OutputExistsSnafu {
                path: output_path.display().to_string(),
            }
        );
        let remove = if output_path.is_dir() {
            std::fs::remove_dir_all(output_path)
        } else {
            std::fs::remove_file(output_path)
        };
        remove.context(RemoveExistingSnafu {
            path: output_path.display().to_string(),
        })?;
    }

    std::fs::create_dir_all(output_path).context(CreateDirSnafu {
        path: output_path.display().to_string(),
    })?;

    let part_path = output_path.join(format!("part-00000-{}.parquet", Uuid::new_v4()));
    let file = File::create(&part_path).context(CreateFileSnafu {
        path: part_path.display().to_string(),
    })?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, Arc::clone(&table.schema), Some(props))
        .context(WriterCreateSnafu)?;
    for batch in &table.batches {
        writer.write(batch).context(WriteBatchSnafu)?;
    }
    writer.close().context(FinalizeSnafu)?;

    let bytes = std::fs::metadata(&part_path).map(|m| m.len()).unwrap_or(0);
    let elapsed = start.elapsed();
    info!(
        rows = table.num_rows(),
        bytes,
        elapsed_ms = elapsed.as_millis() as u64,
        "File saved: {}",
        output_path.display()
    );

    Ok(WriteStats {
        rows: table.num_rows(),
        bytes,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, RecordBatch, StringArray};
    use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    fn test_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, true),
            Field::new("value", DataType::Int64, true),
        ]))
    }

    fn test_table(num_rows: usize) -> Table {
        let ids: StringArray = (0..num_rows).map(|i| Some(format!("id_{i}"))).collect();
        let values: Int64Array = (0..num_rows as i64).map(Some).collect();
        let batch = RecordBatch::try_new(
            test_schema(),
            vec![Arc::new(ids), Arc::new(values)],
        )
        .unwrap();
        Table::new(test_schema(), vec![batch])
    }

    fn data_files(artifact: &Path) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(artifact)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "parquet"))
            .collect()
    }

    fn read_back(artifact: &Path) -> Vec<RecordBatch> {
        let files = data_files(artifact);
        assert_eq!(files.len(), 1, "expected a single-partition artifact");
        let file = File::open(&files[0]).unwrap();
        ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_rows_and_columns() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("out").join("processed.parquet");

        let table = test_table(10);
        let stats = write(&table, &artifact, true).unwrap();
        assert_eq!(stats.rows, 10);
        assert!(stats.bytes > 0);

        let batches = read_back(&artifact);
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 10);
        assert_eq!(batches[0].schema().fields().len(), 2);
        assert_eq!(batches[0].schema().field(0).name(), "id");
    }

    #[test]
    fn test_overwrite_replaces_prior_artifact() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("processed.parquet");

        write(&test_table(5), &artifact, true).unwrap();
        write(&test_table(3), &artifact, true).unwrap();

        // The second write fully replaced the first: one file, three rows
        let batches = read_back(&artifact);
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);
    }

    #[test]
    fn test_no_overwrite_fails_on_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("processed.parquet");

        write(&test_table(5), &artifact, true).unwrap();
        let err = write(&test_table(3), &artifact, false).unwrap_err();
        assert!(matches!(err, WriteError::OutputExists { .. }), "{err}");
    }

    #[test]
    fn test_empty_table_writes_valid_artifact() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("processed.parquet");

        let stats = write(&test_table(0), &artifact, true).unwrap();
        assert_eq!(stats.rows, 0);

        let batches = read_back(&artifact);
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 0);
    }
}
