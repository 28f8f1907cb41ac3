//! icebox CLI: downloads the A/B-test datasets and persists them as Parquet.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use icebox::{init_tracing, Config};

#[derive(Debug, Parser)]
#[command(
    name = "icebox",
    about = "Batch loader for the A/B-test food-delivery datasets"
)]
struct CliArgs {
    /// YAML configuration file overriding the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory raw downloads land in (overrides config).
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Directory processed Parquet artifacts are written to (overrides config).
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(dir) = args.download_dir {
        config.download_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    let report = icebox::run(&config).await;

    for (name, rows) in &report.written {
        info!("{name}: {rows} rows written");
    }

    if report.is_success() {
        info!("Pipeline finished");
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "Pipeline finished with {} stage failure(s); outputs may be incomplete",
            report.failures.len()
        );
        for failure in &report.failures {
            eprintln!("  {} failed during {}: {}", failure.dataset, failure.stage, failure.message);
        }
        ExitCode::FAILURE
    }
}
