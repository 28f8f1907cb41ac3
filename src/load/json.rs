//! NDJSON decoding against a declared schema.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::json::ReaderBuilder;

use crate::error::{DecodeSnafu, DecoderBuildSnafu, LoadError};

use super::Table;

/// Read newline-delimited JSON into record batches typed by `schema`.
///
/// Fields present in the data but absent from the schema are ignored;
/// missing fields decode as null (strict mode is off, matching the
/// schema-forced read of the reference pipeline).
pub(super) fn read_ndjson(
    reader: impl BufRead,
    schema: SchemaRef,
    batch_size: usize,
    path: &Path,
) -> Result<Table, LoadError> {
    let json_reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_batch_size(batch_size)
        .with_strict_mode(false)
        .build(reader)
        .map_err(|e| {
            DecoderBuildSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

    let mut batches = Vec::new();
    for batch in json_reader {
        let batch = batch.map_err(|e| {
            DecodeSnafu {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .build()
        })?;
        batches.push(batch);
    }

    Ok(Table::new(schema, batches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::io::Cursor;

    fn test_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("order_id", DataType::Utf8, true),
            Field::new("order_total_amount", DataType::Float64, true),
        ]))
    }

    #[test]
    fn test_reads_typed_batches() {
        let ndjson = concat!(
            "{\"order_id\": \"o1\", \"order_total_amount\": 42.5}\n",
            "{\"order_id\": \"o2\", \"order_total_amount\": 10.0, \"ignored\": true}\n",
            "{\"order_id\": \"o3\"}\n",
        );

        let table = read_ndjson(
            Cursor::new(ndjson.as_bytes()),
            test_schema(),
            1024,
            Path::new("order.json"),
        )
        .unwrap();

        assert_eq!(table.num_rows(), 3);
        let batch = &table.batches[0];
        let ids = batch
            .column_by_name("order_id")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ids.value(0), "o1");

        // Missing field decodes as null, not as a parse failure
        let totals = batch
            .column_by_name("order_total_amount")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(totals.value(0), 42.5);
        assert!(totals.is_null(2));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let ndjson = "{\"order_id\": \"o1\"}\nnot json at all\n";

        let err = read_ndjson(
            Cursor::new(ndjson.as_bytes()),
            test_schema(),
            1024,
            Path::new("order.json"),
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::Decode { .. }), "{err}");
    }

    #[test]
    fn test_batch_size_splits_output() {
        let ndjson: String = (0..5).map(|i| format!("{{\"order_id\": \"o{i}\"}}\n")).collect();

        let table = read_ndjson(
            Cursor::new(ndjson.into_bytes()),
            test_schema(),
            2,
            Path::new("order.json"),
        )
        .unwrap();

        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.batches.len(), 3);
    }
}
