//! Streamed HTTP download of source files.
//!
//! Downloads are idempotent: a destination file that already exists is left
//! untouched and no network call is made, so a rerun only fetches what is
//! missing.

use std::path::Path;

use futures::StreamExt;
use snafu::prelude::*;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::config::DOWNLOAD_CHUNK_SIZE;
use crate::error::{BodySnafu, DownloadError, HttpSnafu, HttpStatusSnafu, WriteFileSnafu};

/// Outcome of a fetch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination file already existed; nothing was downloaded.
    AlreadyPresent,
    /// The file was downloaded.
    Downloaded { bytes: u64 },
}

/// Download `url` to `dest`, skipping the transfer if `dest` already exists.
///
/// The body is streamed to disk through a fixed-size buffer rather than
/// collected in memory. A failed transfer may leave a truncated file at
/// `dest`; no cleanup is attempted.
pub async fn fetch(
    client: &reqwest::Client,
    name: &str,
    url: &str,
    dest: &Path,
) -> Result<FetchOutcome, DownloadError> {
    if dest.exists() {
        info!("Already exists, skipping download: {name}");
        return Ok(FetchOutcome::AlreadyPresent);
    }

    info!("Downloading {name} from {url}");

    let response = client.get(url).send().await.context(HttpSnafu { url })?;
    let status = response.status();
    ensure!(status.is_success(), HttpStatusSnafu { url, status });

    let file = tokio::fs::File::create(dest)
        .await
        .context(WriteFileSnafu {
            path: dest.display().to_string(),
        })?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

    let mut stream = response.bytes_stream();
    let mut bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context(BodySnafu { url })?;
        writer.write_all(&chunk).await.context(WriteFileSnafu {
            path: dest.display().to_string(),
        })?;
        bytes += chunk.len() as u64;
        debug!(name, bytes, "download progress");
    }
    writer.flush().await.context(WriteFileSnafu {
        path: dest.display().to_string(),
    })?;

    info!("Downloaded {name} ({bytes} bytes)");
    Ok(FetchOutcome::Downloaded { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_existing_file_skips_network() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("order.json.gz");
        std::fs::write(&dest, b"original contents").unwrap();

        // The URL is unreachable; the call must succeed without touching it.
        let client = reqwest::Client::new();
        let outcome = fetch(&client, "orders", "http://127.0.0.1:1/order.json.gz", &dest)
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
        assert_eq!(std::fs::read(&dest).unwrap(), b"original contents");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing.csv.gz");

        let client = reqwest::Client::new();
        let err = fetch(&client, "consumers", "http://127.0.0.1:1/missing.csv.gz", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Http { .. }), "{err}");
        // The request failed before the destination was created.
        assert!(!dest.exists());
    }
}
