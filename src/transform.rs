//! Cleaning rules and item explosion.
//!
//! Two independent transformations:
//! - row filtering drops rows where required columns are null (orders and
//!   the A/B-test table only);
//! - item explosion decodes each order's `items` text as a typed array and
//!   emits one flat row per element, carrying the parent keys.

use std::sync::Arc;

use arrow::array::{
    Array, BooleanArray, Float64Builder, Int32Builder, RecordBatch, StringArray, StringBuilder,
};
use arrow::compute::{and, filter_record_batch, is_not_null};
use serde::Deserialize;
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::error::{
    BuildBatchSnafu, ColumnMissingSnafu, ColumnTypeSnafu, FilterSnafu, TransformError,
};
use crate::load::Table;
use crate::schema::item_schema;

/// Columns that must be non-null in a cleaned orders row.
pub const ORDER_REQUIRED_COLUMNS: [&str; 3] = ["customer_id", "order_id", "order_total_amount"];

/// Columns that must be non-null in a cleaned A/B-test row.
pub const ABTEST_REQUIRED_COLUMNS: [&str; 1] = ["is_target"];

/// One element of an order's encoded `items` array.
#[derive(Debug, Deserialize)]
struct OrderItem {
    external_id: Option<String>,
    name: Option<String>,
    price: Option<f64>,
    quantity: Option<i32>,
    total_price: Option<f64>,
}

/// Counters from an explosion pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplodeStats {
    /// Order rows inspected.
    pub orders_seen: usize,
    /// Item rows emitted.
    pub items_emitted: usize,
    /// Order rows dropped because their `items` text failed to decode.
    pub decode_failures: usize,
}

/// Drop rows where any of `columns` is null.
///
/// Filtering happens per batch with compute kernels; batches that lose no
/// rows are still rebuilt by the filter, which keeps the logic uniform.
pub fn drop_null_rows(table: &Table, columns: &[&str]) -> Result<Table, TransformError> {
    let mut batches = Vec::with_capacity(table.batches.len());
    let mut dropped = 0;

    for batch in &table.batches {
        let mut keep: Option<BooleanArray> = None;
        for name in columns {
            let column = batch
                .column_by_name(name)
                .context(ColumnMissingSnafu { name: *name })?;
            let mask = is_not_null(column).context(FilterSnafu)?;
            keep = Some(match keep {
                Some(prev) => and(&prev, &mask).context(FilterSnafu)?,
                None => mask,
            });
        }

        let filtered = match keep {
            Some(keep) => filter_record_batch(batch, &keep).context(FilterSnafu)?,
            None => batch.clone(),
        };
        dropped += batch.num_rows() - filtered.num_rows();
        batches.push(filtered);
    }

    if dropped > 0 {
        debug!(dropped, required = ?columns, "Dropped rows with null required columns");
    }
    Ok(Table::new(Arc::clone(&table.schema), batches))
}

/// Explode the `items` column of a cleaned orders table into a flat item
/// table.
///
/// An order with null or empty `items` contributes zero rows. An order whose
/// `items` text fails to decode is dropped from the item table entirely (no
/// partial items), logged with its `order_id`, and counted; the batch keeps
/// going.
pub fn explode_items(orders: &Table) -> Result<(Table, ExplodeStats), TransformError> {
    let schema = item_schema();
    let mut stats = ExplodeStats::default();

    let mut order_ids = StringBuilder::new();
    let mut customer_ids = StringBuilder::new();
    let mut names = StringBuilder::new();
    let mut prices = Float64Builder::new();
    let mut quantities = Int32Builder::new();
    let mut total_prices = Float64Builder::new();
    let mut external_ids = StringBuilder::new();

    for batch in &orders.batches {
        let order_id = string_column(batch, "order_id")?;
        let customer_id = string_column(batch, "customer_id")?;
        let items = string_column(batch, "items")?;

        for row in 0..batch.num_rows() {
            stats.orders_seen += 1;

            if items.is_null(row) {
                continue;
            }
            let raw = items.value(row);
            if raw.trim().is_empty() {
                continue;
            }

            let parsed: Vec<OrderItem> = match serde_json::from_str(raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    stats.decode_failures += 1;
                    let parent = order_id.is_valid(row).then(|| order_id.value(row));
                    warn!(
                        order_id = parent.unwrap_or("<null>"),
                        error = %e,
                        "Dropping order with undecodable items"
                    );
                    continue;
                }
            };

            for item in parsed {
                order_ids.append_option(order_id.is_valid(row).then(|| order_id.value(row)));
                customer_ids
                    .append_option(customer_id.is_valid(row).then(|| customer_id.value(row)));
                names.append_option(item.name);
                prices.append_option(item.price);
                quantities.append_option(item.quantity);
                total_prices.append_option(item.total_price);
                external_ids.append_option(item.external_id);
                stats.items_emitted += 1;
            }
        }
    }

    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(order_ids.finish()),
            Arc::new(customer_ids.finish()),
            Arc::new(names.finish()),
            Arc::new(prices.finish()),
            Arc::new(quantities.finish()),
            Arc::new(total_prices.finish()),
            Arc::new(external_ids.finish()),
        ],
    )
    .context(BuildBatchSnafu)?;

    Ok((Table::new(schema, vec![batch]), stats))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, TransformError> {
    let column = batch
        .column_by_name(name)
        .context(ColumnMissingSnafu { name })?;
    column
        .as_any()
        .downcast_ref::<StringArray>()
        .context(ColumnTypeSnafu { name })
}
