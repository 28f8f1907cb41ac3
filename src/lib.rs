//! icebox: batch loader for the A/B-test food-delivery datasets.
//!
//! This crate handles:
//! - Downloading the four public source files (NDJSON.gz, CSV.gz, tar.gz)
//! - Unpacking the gzip-tar archive, skipping archiver metadata entries
//! - Loading raw files into Arrow record batches with declared schemas
//! - Dropping rows that violate the non-null invariants
//! - Exploding the nested order-items text column into a flat item table
//! - Writing each table as a single-file Parquet artifact

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod trace;
pub mod transform;

// Re-export commonly used items
pub use config::{Config, Dataset};
pub use load::Table;
pub use pipeline::{run, PipelineReport};
pub use trace::init_tracing;
