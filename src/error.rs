//! Error types for the icebox loader.
//!
//! Each pipeline stage has its own error enum so the orchestrator can report
//! exactly which stage failed for which dataset. Nothing here is swallowed:
//! every stage returns a `Result` that the orchestrator checks.

use snafu::prelude::*;

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file"))]
    ReadConfig { source: std::io::Error },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration"))]
    YamlParse { source: serde_yaml::Error },

    /// A dataset has no URL configured.
    #[snafu(display("Dataset {name} has an empty URL"))]
    EmptyUrl { name: String },

    /// A dataset has no file name configured.
    #[snafu(display("Dataset {name} has an empty file name"))]
    EmptyFileName { name: String },

    /// Download directory is empty.
    #[snafu(display("Download directory cannot be empty"))]
    EmptyDownloadDir,

    /// Output directory is empty.
    #[snafu(display("Output directory cannot be empty"))]
    EmptyOutputDir,

    /// Batch size must be non-zero.
    #[snafu(display("Batch size cannot be zero"))]
    ZeroBatchSize,
}

/// Errors that can occur while downloading a source file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DownloadError {
    /// The HTTP request could not be sent.
    #[snafu(display("Request for {url} failed: {source}"))]
    Http { url: String, source: reqwest::Error },

    /// The server answered with a non-success status.
    #[snafu(display("Server returned {status} for {url}"))]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The response body stream broke mid-transfer.
    #[snafu(display("Failed to read response body for {url}: {source}"))]
    Body { url: String, source: reqwest::Error },

    /// Failed to write the downloaded bytes to disk.
    #[snafu(display("Failed to write {path}: {source}"))]
    WriteFile {
        path: String,
        source: std::io::Error,
    },
}

/// Errors that can occur while unpacking a gzip-tar archive.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExtractError {
    /// The archive file could not be opened.
    #[snafu(display("Failed to open archive {path}: {source}"))]
    OpenArchive {
        path: String,
        source: std::io::Error,
    },

    /// The archive entries could not be enumerated or read.
    #[snafu(display("Failed to read archive entries: {source}"))]
    ReadEntries { source: std::io::Error },

    /// An entry could not be unpacked into the target directory.
    #[snafu(display("Failed to unpack {entry}: {source}"))]
    Unpack {
        entry: String,
        source: std::io::Error,
    },
}

/// Errors that can occur while loading a raw file into record batches.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LoadError {
    /// The input file does not exist at the expected path.
    #[snafu(display("Input file not found: {path}"))]
    MissingFile { path: String },

    /// The input file could not be read.
    #[snafu(display("Failed to read {path}: {source}"))]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// The input file could not be decompressed.
    #[snafu(display("Failed to decompress {path}: {message}"))]
    Decompression { path: String, message: String },

    /// Failed to build the Arrow decoder for the declared schema.
    #[snafu(display("Failed to build decoder: {message}"))]
    DecoderBuild { message: String },

    /// A record in the file did not decode against the declared schema.
    #[snafu(display("Failed to decode {path}: {message}"))]
    Decode { path: String, message: String },
}

/// Errors that can occur during cleaning and item explosion.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransformError {
    /// A required column is absent from the batch.
    #[snafu(display("Column {name} is missing from the batch"))]
    ColumnMissing { name: String },

    /// A required column has an unexpected Arrow type.
    #[snafu(display("Column {name} has an unexpected type"))]
    ColumnType { name: String },

    /// A compute kernel (null mask, filter) failed.
    #[snafu(display("Failed to filter batch: {source}"))]
    Filter { source: arrow::error::ArrowError },

    /// The exploded item arrays could not be assembled into a batch.
    #[snafu(display("Failed to build item batch: {source}"))]
    BuildBatch { source: arrow::error::ArrowError },
}

/// Errors that can occur while persisting a table to Parquet.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WriteError {
    /// A directory on the output path could not be created.
    #[snafu(display("Failed to create directory {path}: {source}"))]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    /// The output artifact exists and overwrite was not requested.
    #[snafu(display("Output already exists: {path}"))]
    OutputExists { path: String },

    /// A stale artifact at the output path could not be removed.
    #[snafu(display("Failed to remove existing output {path}: {source}"))]
    RemoveExisting {
        path: String,
        source: std::io::Error,
    },

    /// The data file inside the artifact could not be created.
    #[snafu(display("Failed to create {path}: {source}"))]
    CreateFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to create the Parquet writer.
    #[snafu(display("Failed to create Parquet writer: {source}"))]
    WriterCreate {
        source: parquet::errors::ParquetError,
    },

    /// Failed to write a record batch to Parquet.
    #[snafu(display("Failed to write to Parquet: {source}"))]
    WriteBatch {
        source: parquet::errors::ParquetError,
    },

    /// Failed to finalize the Parquet file footer.
    #[snafu(display("Failed to finalize Parquet file: {source}"))]
    Finalize {
        source: parquet::errors::ParquetError,
    },
}
