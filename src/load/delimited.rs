//! Delimited-text decoding against a declared schema.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow::datatypes::SchemaRef;

use crate::error::{DecodeSnafu, DecoderBuildSnafu, LoadError};

use super::Table;

/// Read delimited text into record batches typed by `schema`.
///
/// When `has_header` is set the first row is consumed as a header; its
/// column names are discarded in favor of the declared schema.
pub(super) fn read_delimited(
    reader: impl BufRead,
    schema: SchemaRef,
    has_header: bool,
    batch_size: usize,
    path: &Path,
) -> Result<Table, LoadError> {
    let csv_reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_header(has_header)
        .with_batch_size(batch_size)
        .build(reader)
        .map_err(|e| {
            DecoderBuildSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

    let mut batches = Vec::new();
    for batch in csv_reader {
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
    use arrow::array::{BooleanArray, Int32Array, StringArray, TimestampMicrosecondArray};
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use std::io::Cursor;

    fn test_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("customer_id", DataType::Utf8, true),
            Field::new("active", DataType::Boolean, true),
            Field::new("price_range", DataType::Int32, true),
            Field::new(
                "created_at",
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                true,
            ),
        ]))
    }

    #[test]
    fn test_header_names_discarded_for_schema() {
        let csv = "col_a,col_b,col_c,col_d\nc1,true,3,2019-01-27T20:35:21Z\n";

        let table = read_delimited(
            Cursor::new(csv.as_bytes()),
            test_schema(),
            true,
            1024,
            Path::new("consumer.csv"),
        )
        .unwrap();

        assert_eq!(table.num_rows(), 1);
        let batch = &table.batches[0];
        assert_eq!(batch.schema().field(0).name(), "customer_id");

        let ids = batch
            .column_by_name("customer_id")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(ids.value(0), "c1");

        let active = batch
            .column_by_name("active")
            .unwrap()
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap();
        assert!(active.value(0));

        let ranges = batch
            .column_by_name("price_range")
            .unwrap()
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap();
        assert_eq!(ranges.value(0), 3);

        let created = batch
            .column_by_name("created_at")
            .unwrap()
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        // 2019-01-27T20:35:21Z in microseconds since the epoch
        assert_eq!(created.value(0), 1_548_621_321_000_000);
    }

    #[test]
    fn test_no_header_reads_first_row_as_data() {
        let csv = "c1,true,3,2019-01-27T20:35:21Z\nc2,false,1,2020-05-01T00:00:00Z\n";

        let table = read_delimited(
            Cursor::new(csv.as_bytes()),
            test_schema(),
            false,
            1024,
            Path::new("consumer.csv"),
        )
        .unwrap();

        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let csv = "customer_id,active,price_range,created_at\nc1,true,not_a_number,2019-01-27T20:35:21Z\n";

        let err = read_delimited(
            Cursor::new(csv.as_bytes()),
            test_schema(),
            true,
            1024,
            Path::new("consumer.csv"),
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::Decode { .. }), "{err}");
    }
}
