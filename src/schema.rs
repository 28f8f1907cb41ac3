//! Declared column layouts for the four source tables and the derived
//! item table.
//!
//! Schemas are passed to the loader so column typing is forced rather than
//! inferred from the data. Inference is slower and non-deterministic across
//! runs, so every table ships with a static declaration.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};

use crate::config::Dataset;

/// Semantic field types supported by the declared schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    Timestamp,
}

impl FieldType {
    /// Convert to Arrow DataType.
    pub fn to_arrow_type(self) -> DataType {
        match self {
            FieldType::String => DataType::Utf8,
            FieldType::Int32 => DataType::Int32,
            FieldType::Int64 => DataType::Int64,
            FieldType::Float32 => DataType::Float32,
            FieldType::Float64 => DataType::Float64,
            FieldType::Boolean => DataType::Boolean,
            FieldType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        }
    }
}

fn build(fields: &[(&str, FieldType)]) -> SchemaRef {
    let fields: Vec<Field> = fields
        .iter()
        .map(|(name, field_type)| Field::new(*name, field_type.to_arrow_type(), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Schema of the raw orders table. The `items` column holds the encoded
/// item array as text until the explosion step decodes it.
pub fn order_schema() -> SchemaRef {
    use FieldType::*;
    build(&[
        ("cpf", String),
        ("customer_id", String),
        ("customer_name", String),
        ("delivery_address_city", String),
        ("delivery_address_country", String),
        ("delivery_address_district", String),
        ("delivery_address_external_id", String),
        ("delivery_address_latitude", Float64),
        ("delivery_address_longitude", Float64),
        ("delivery_address_state", String),
        ("delivery_address_zip_code", String),
        ("items", String),
        ("merchant_id", String),
        ("merchant_latitude", Float64),
        ("merchant_longitude", Float64),
        ("merchant_timezone", String),
        ("order_created_at", Timestamp),
        ("order_id", String),
        ("order_scheduled", Boolean),
        ("order_total_amount", Float64),
        ("origin_platform", String),
        ("order_scheduled_date", Timestamp),
    ])
}

/// Schema of the consumer table.
pub fn consumer_schema() -> SchemaRef {
    use FieldType::*;
    build(&[
        ("customer_id", String),
        ("language", String),
        ("created_at", Timestamp),
        ("active", Boolean),
        ("customer_name", String),
        ("customer_phone_area", String),
        ("customer_phone_number", String),
    ])
}

/// Schema of the restaurant table.
pub fn restaurant_schema() -> SchemaRef {
    use FieldType::*;
    build(&[
        ("id", String),
        ("created_at", Timestamp),
        ("enabled", Boolean),
        ("price_range", Int32),
        ("average_ticket", Float64),
        ("takeout_time", Int32),
        ("delivery_time", Float64),
        ("minimum_order_value", Float64),
        ("merchant_zip_code", String),
        ("merchant_city", String),
        ("merchant_state", String),
        ("merchant_country", String),
    ])
}

/// Schema of the A/B-test assignment table.
pub fn abtest_schema() -> SchemaRef {
    use FieldType::*;
    build(&[("customer_id", String), ("is_target", String)])
}

/// Schema of the derived item table: one row per order item, carrying the
/// parent order's keys.
pub fn item_schema() -> SchemaRef {
    use FieldType::*;
    build(&[
        ("order_id", String),
        ("customer_id", String),
        ("name", String),
        ("price", Float64),
        ("quantity", Int32),
        ("total_price", Float64),
        ("external_id", String),
    ])
}

/// Declared schema for a source dataset.
pub fn for_dataset(dataset: Dataset) -> SchemaRef {
    match dataset {
        Dataset::Orders => order_schema(),
        Dataset::Consumers => consumer_schema(),
        Dataset::Restaurants => restaurant_schema(),
        Dataset::AbTest => abtest_schema(),
    }
}
