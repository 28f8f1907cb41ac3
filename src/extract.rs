//! Gzip-tar archive extraction.
//!
//! The A/B-test dataset ships as a tar.gz whose listing can contain
//! AppleDouble metadata entries (`._` prefix) left behind by macOS archivers.
//! Those entries are filtered out; everything else is unpacked into the
//! target directory. Partially extracted files are not rolled back on error.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::error::{ExtractError, OpenArchiveSnafu, ReadEntriesSnafu, UnpackSnafu};

/// Unpack `archive_path` into `target_dir`, skipping metadata entries.
///
/// Returns the number of entries actually unpacked.
pub fn extract(archive_path: &Path, target_dir: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path).context(OpenArchiveSnafu {
        path: archive_path.display().to_string(),
    })?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut unpacked = 0;
    for entry in archive.entries().context(ReadEntriesSnafu)? {
        let mut entry = entry.context(ReadEntriesSnafu)?;
        let entry_path = entry
            .path()
            .context(ReadEntriesSnafu)?
            .into_owned();
        info!("archive entry: {}", entry_path.display());

        if is_metadata_entry(&entry_path) {
            debug!("skipping metadata entry: {}", entry_path.display());
            continue;
        }

        entry.unpack_in(target_dir).context(UnpackSnafu {
            entry: entry_path.display().to_string(),
        })?;
        unpacked += 1;
    }

    info!(
        "Extracted {} entries from {} into {}",
        unpacked,
        archive_path.display(),
        target_dir.display()
    );
    Ok(unpacked)
}

/// AppleDouble resource forks are named `._<original>`.
fn is_metadata_entry(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("._"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn make_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let gz = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_metadata_entries_are_filtered() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("ab_test_ref.tar.gz");
        make_archive(
            &archive,
            &[
                ("a.csv", b"customer_id,is_target\nc1,target\n" as &[u8]),
                ("._a.csv", b"\x00\x05\x16\x07"),
            ],
        );

        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        let unpacked = extract(&archive, &target).unwrap();

        assert_eq!(unpacked, 1);
        assert!(target.join("a.csv").exists());
        assert!(!target.join("._a.csv").exists());
    }

    #[test]
    fn test_nested_metadata_entries_are_filtered() {
        assert!(is_metadata_entry(Path::new("._ab_test_ref.csv")));
        assert!(is_metadata_entry(Path::new("./sub/._ab_test_ref.csv")));
        assert!(!is_metadata_entry(Path::new("ab_test_ref.csv")));
        assert!(!is_metadata_entry(Path::new("sub/ab_test_ref.csv")));
    }

    #[test]
    fn test_missing_archive_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = extract(&dir.path().join("absent.tar.gz"), dir.path()).unwrap_err();
        assert!(matches!(err, ExtractError::OpenArchive { .. }), "{err}");
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bad.tar.gz");
        std::fs::write(&archive, b"this is not a tarball").unwrap();

        let err = extract(&archive, dir.path()).unwrap_err();
        assert!(matches!(err, ExtractError::ReadEntries { .. }), "{err}");
    }
}
