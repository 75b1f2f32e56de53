//! Error conversion utilities for CLI.
//!
//! Converts unspool-core's typed errors (thiserror) into user-facing
//! errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use unspool_core::ExtractionError;

/// Converts `ExtractionError` to a user-friendly anyhow error.
pub fn convert_extraction_error(err: ExtractionError, archive: &Path) -> anyhow::Error {
    match err {
        ExtractionError::PathEscape { path, reason } => {
            anyhow!(
                "Security violation: entry '{}' in '{}' escapes the destination ({reason})\n\
                 HINT: This archive may be malicious. Do not extract from untrusted sources.",
                path.display(),
                archive.display()
            )
        }
        ExtractionError::SizeLimitExceeded { limit, attempted } => {
            anyhow!(
                "Extraction of '{}' exceeded the byte budget: {attempted} bytes attempted, limit {limit}\n\
                 HINT: Use --max-bytes to raise the budget (0 disables it).",
                archive.display()
            )
        }
        ExtractionError::SymlinkTargetTooLong { path, limit } => {
            anyhow!(
                "Symlink '{}' in '{}' stores a target longer than {limit} bytes\n\
                 HINT: This archive may be malicious or corrupted.",
                path.display(),
                archive.display()
            )
        }
        ExtractionError::TargetNotFound { link, target } => {
            anyhow!(
                "Hard link '{}' in '{}' refers to '{}', which the archive never provides\n\
                 HINT: The archive may be corrupted, or --strip-components removed the target.",
                link.display(),
                archive.display(),
                target.display()
            )
        }
        ExtractionError::IncompleteEntry {
            path,
            written,
            expected,
        } => {
            anyhow!(
                "Truncated entry '{}' in '{}': got {written} of {expected} bytes\n\
                 HINT: The archive may be corrupted or incompletely downloaded.",
                path.display(),
                archive.display()
            )
        }
        ExtractionError::UnsupportedFormat => {
            anyhow!(
                "Archive format not supported: {}\n\
                 HINT: Supported formats: tar, tar.gz, tar.bz2, tar.xz, tar.zst, zip",
                archive.display()
            )
        }
        ExtractionError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{}': {reason}\n\
                 HINT: The archive may be corrupted or malformed.",
                archive.display()
            )
        }
        err @ ExtractionError::Cancelled => anyhow::Error::from(err)
            .context(format!("Interrupted while extracting '{}'", archive.display())),
        ExtractionError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {io_err}",
                archive.display()
            )
        }
        err @ ExtractionError::EntryIo { .. } => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Converts a failure to open the output directory.
pub fn convert_dest_error(err: ExtractionError, dir: &Path) -> anyhow::Error {
    match err {
        ExtractionError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            anyhow!(
                "Output directory '{}' does not exist\n\
                 HINT: Pass --create to create it.",
                dir.display()
            )
        }
        other => anyhow::Error::from(other)
            .context(format!("Cannot use output directory '{}'", dir.display())),
    }
}

/// Adds archive context to a core result.
pub fn add_archive_context<T>(
    result: Result<T, ExtractionError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_extraction_error(e, archive))
}
