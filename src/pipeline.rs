//! Sequential pipeline orchestration.
//!
//! Stages run in the order fetch, extract, load, transform, write. Every
//! stage returns an explicit result; a failure is recorded in the report,
//! the stages that depend on it are skipped, and independent datasets keep
//! going. The process exit code reflects the report, so a partially failed
//! run is visible without reading the whole log.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{error, info};

use crate::config::{Config, Dataset, ITEM_ORDERS_OUTPUT};
use crate::load::Table;
use crate::transform::{ABTEST_REQUIRED_COLUMNS, ORDER_REQUIRED_COLUMNS};
use crate::{extract, fetch, load, schema, sink, transform};

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Load,
    Transform,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Load => "load",
            Stage::Transform => "transform",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// One recorded stage failure.
#[derive(Debug, Clone)]
pub struct StageFailure {
    pub dataset: String,
    pub stage: Stage,
    pub message: String,
}

/// Outcome of a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Every stage failure, in the order it occurred.
    pub failures: Vec<StageFailure>,
    /// Row counts of successfully written artifacts.
    pub written: Vec<(String, usize)>,
}

impl PipelineReport {
    /// True when no stage failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, dataset: &str, stage: Stage, err: &dyn fmt::Display) {
        error!("{dataset} failed during {stage}: {err}");
        self.failures.push(StageFailure {
            dataset: dataset.to_string(),
            stage,
            message: err.to_string(),
        });
    }
}

/// Run the full pipeline against `config`.
pub async fn run(config: &Config) -> PipelineReport {
    let mut report = PipelineReport::default();

    if let Err(e) = std::fs::create_dir_all(&config.download_dir) {
        report.record_failure(&config.download_dir.display().to_string(), Stage::Fetch, &e);
        return report;
    }

    let mut failed: HashSet<Dataset> = HashSet::new();

    // Fetch all four sources, one after another.
    let client = reqwest::Client::new();
    for dataset in Dataset::all() {
        let source = config.source(dataset);
        let dest = config.raw_path(source);
        if let Err(e) = fetch::fetch(&client, dataset.name(), &source.url, &dest).await {
            report.record_failure(dataset.name(), Stage::Fetch, &e);
            failed.insert(dataset);
        }
    }

    // Unpack archive sources into the download directory.
    for dataset in Dataset::all() {
        let source = config.source(dataset);
        if source.archive_member.is_none() || failed.contains(&dataset) {
            continue;
        }
        if let Err(e) = extract::extract(&config.raw_path(source), &config.download_dir) {
            report.record_failure(dataset.name(), Stage::Extract, &e);
            failed.insert(dataset);
        }
    }

    // Load with declared schemas.
    let mut tables: HashMap<Dataset, Table> = HashMap::new();
    for dataset in Dataset::all() {
        if failed.contains(&dataset) {
            continue;
        }
        let source = config.source(dataset);
        let path = config.load_path(source);
        match load::load(&path, source, schema::for_dataset(dataset), config.batch_size) {
            Ok(table) => {
                info!("Loaded {dataset}: {} rows", table.num_rows());
                tables.insert(dataset, table);
            }
            Err(e) => report.record_failure(dataset.name(), Stage::Load, &e),
        }
    }

    // Clean orders and explode their items.
    let mut item_table: Option<Table> = None;
    if let Some(orders) = tables.remove(&Dataset::Orders) {
        match transform::drop_null_rows(&orders, &ORDER_REQUIRED_COLUMNS) {
            Ok(cleaned) => {
                match transform::explode_items(&cleaned) {
                    Ok((items, stats)) => {
                        info!(
                            orders = stats.orders_seen,
                            items = stats.items_emitted,
                            dropped = stats.decode_failures,
                            "Exploded order items"
                        );
                        item_table = Some(items);
                    }
                    Err(e) => report.record_failure(ITEM_ORDERS_OUTPUT, Stage::Transform, &e),
                }
                tables.insert(Dataset::Orders, cleaned);
            }
            Err(e) => report.record_failure(Dataset::Orders.name(), Stage::Transform, &e),
        }
    }

    // Clean the A/B-test assignments.
    if let Some(abtest) = tables.remove(&Dataset::AbTest) {
        match transform::drop_null_rows(&abtest, &ABTEST_REQUIRED_COLUMNS) {
            Ok(cleaned) => {
                tables.insert(Dataset::AbTest, cleaned);
            }
            Err(e) => report.record_failure(Dataset::AbTest.name(), Stage::Transform, &e),
        }
    }

    // Persist the four cleaned tables plus the derived item table.
    for dataset in Dataset::all() {
        let Some(table) = tables.get(&dataset) else {
            continue;
        };
        let output = config.output_path(dataset.output_name());
        match sink::write(table, &output, true) {
            Ok(stats) => report
                .written
                .push((dataset.output_name().to_string(), stats.rows)),
            Err(e) => report.record_failure(dataset.name(), Stage::Write, &e),
        }
    }
    if let Some(items) = &item_table {
        let output = config.output_path(ITEM_ORDERS_OUTPUT);
        match sink::write(items, &output, true) {
            Ok(stats) => report
                .written
                .push((ITEM_ORDERS_OUTPUT.to_string(), stats.rows)),
            Err(e) => report.record_failure(ITEM_ORDERS_OUTPUT, Stage::Write, &e),
        }
    }

    report
}
