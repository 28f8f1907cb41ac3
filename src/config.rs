//! Configuration for the icebox loader.
//!
//! The built-in defaults reproduce the reference pipeline: four fixed source
//! URLs, raw files under `download_data/`, outputs under `trusted_data/`.
//! A YAML file can override any part of it; missing fields fall back to the
//! defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::error::{
    ConfigError, EmptyDownloadDirSnafu, EmptyFileNameSnafu, EmptyOutputDirSnafu, EmptyUrlSnafu,
    ReadConfigSnafu, YamlParseSnafu, ZeroBatchSizeSnafu,
};

/// One kibibyte.
pub const KB: usize = 1024;

/// Buffer capacity for chunked download writes.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * KB;

fn default_batch_size() -> usize {
    8192
}

fn default_has_header() -> bool {
    true
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("download_data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("trusted_data")
}

const SOURCE_BASE_URL: &str = "https://data-architect-test-source.s3-sa-east-1.amazonaws.com";

/// The four source datasets the pipeline ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Orders,
    Consumers,
    Restaurants,
    AbTest,
}

impl Dataset {
    /// All datasets in pipeline order.
    pub fn all() -> [Dataset; 4] {
        [
            Dataset::Orders,
            Dataset::Consumers,
            Dataset::Restaurants,
            Dataset::AbTest,
        ]
    }

    /// Short identifier used in logs and failure reports.
    pub fn name(self) -> &'static str {
        match self {
            Dataset::Orders => "orders",
            Dataset::Consumers => "consumers",
            Dataset::Restaurants => "restaurants",
            Dataset::AbTest => "abtest",
        }
    }

    /// Stem of the output artifact (`<stem>.parquet`).
    pub fn output_name(self) -> &'static str {
        match self {
            Dataset::Orders => "processed_orders",
            Dataset::Consumers => "processed_users",
            Dataset::Restaurants => "processed_restaurants",
            Dataset::AbTest => "processed_abtest",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stem of the derived item-orders artifact.
pub const ITEM_ORDERS_OUTPUT: &str = "processed_item_orders";

/// Format of a raw source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Newline-delimited JSON, one record per line.
    Json,
    /// Delimited text with an optional header row.
    #[default]
    Csv,
}

/// Compression format of a raw source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFormat {
    #[default]
    Gzip,
    None,
}

/// Configuration for one source dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL the raw file is downloaded from.
    pub url: String,
    /// File name of the raw download inside the download directory.
    pub file_name: String,
    /// Format of the file the loader reads.
    #[serde(default)]
    pub format: SourceFormat,
    /// Compression of the file the loader reads.
    #[serde(default)]
    pub compression: CompressionFormat,
    /// Whether the first row of a delimited file is a header. Header names
    /// are discarded in favor of the declared schema.
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    /// When the raw download is a gzip-tar archive, the member file the
    /// loader reads after extraction. Verified to exist before loading.
    #[serde(default)]
    pub archive_member: Option<String>,
}

impl SourceConfig {
    fn orders() -> Self {
        Self {
            url: format!("{SOURCE_BASE_URL}/order.json.gz"),
            file_name: "order.json.gz".into(),
            format: SourceFormat::Json,
            compression: CompressionFormat::Gzip,
            has_header: default_has_header(),
            archive_member: None,
        }
    }

    fn consumers() -> Self {
        Self {
            url: format!("{SOURCE_BASE_URL}/consumer.csv.gz"),
            file_name: "consumer.csv.gz".into(),
            format: SourceFormat::Csv,
            compression: CompressionFormat::Gzip,
            has_header: default_has_header(),
            archive_member: None,
        }
    }

    fn restaurants() -> Self {
        Self {
            url: format!("{SOURCE_BASE_URL}/restaurant.csv.gz"),
            file_name: "restaurant.csv.gz".into(),
            format: SourceFormat::Csv,
            compression: CompressionFormat::Gzip,
            has_header: default_has_header(),
            archive_member: None,
        }
    }

    fn abtest() -> Self {
        Self {
            url: format!("{SOURCE_BASE_URL}/ab_test_ref.tar.gz"),
            file_name: "ab_test_ref.tar.gz".into(),
            format: SourceFormat::Csv,
            // The loader reads the extracted member, which is plain CSV.
            compression: CompressionFormat::None,
            has_header: default_has_header(),
            archive_member: Some("ab_test_ref.csv".into()),
        }
    }
}

/// Main configuration for icebox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory raw downloads and extracted files land in.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Directory the processed Parquet artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Number of records per Arrow batch when loading.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "SourceConfig::orders")]
    pub orders: SourceConfig,
    #[serde(default = "SourceConfig::consumers")]
    pub consumers: SourceConfig,
    #[serde(default = "SourceConfig::restaurants")]
    pub restaurants: SourceConfig,
    #[serde(default = "SourceConfig::abtest")]
    pub abtest: SourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            output_dir: default_output_dir(),
            batch_size: default_batch_size(),
            orders: SourceConfig::orders(),
            consumers: SourceConfig::consumers(),
            restaurants: SourceConfig::restaurants(),
            abtest: SourceConfig::abtest(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).context(ReadConfigSnafu)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and validate it.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents).context(YamlParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            !self.download_dir.as_os_str().is_empty(),
            EmptyDownloadDirSnafu
        );
        ensure!(!self.output_dir.as_os_str().is_empty(), EmptyOutputDirSnafu);
        ensure!(self.batch_size > 0, ZeroBatchSizeSnafu);
        for dataset in Dataset::all() {
            let source = self.source(dataset);
            ensure!(
                !source.url.is_empty(),
                EmptyUrlSnafu {
                    name: dataset.name()
                }
            );
            ensure!(
                !source.file_name.is_empty(),
                EmptyFileNameSnafu {
                    name: dataset.name()
                }
            );
        }
        Ok(())
    }

    /// Source configuration for a dataset.
    pub fn source(&self, dataset: Dataset) -> &SourceConfig {
        match dataset {
            Dataset::Orders => &self.orders,
            Dataset::Consumers => &self.consumers,
            Dataset::Restaurants => &self.restaurants,
            Dataset::AbTest => &self.abtest,
        }
    }

    /// Path the raw download for a dataset lands at.
    pub fn raw_path(&self, source: &SourceConfig) -> PathBuf {
        self.download_dir.join(&source.file_name)
    }

    /// Path the loader reads for a dataset. For archive sources this is the
    /// extracted member, not the archive itself.
    pub fn load_path(&self, source: &SourceConfig) -> PathBuf {
        match &source.archive_member {
            Some(member) => self.download_dir.join(member),
            None => self.raw_path(source),
        }
    }

    /// Path of the output artifact with the given stem.
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.parquet"))
    }
}
