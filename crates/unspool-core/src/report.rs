//! Extraction operation reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Report of a completed extraction.
///
/// `created` lists every file, symlink and hard link the extraction
/// materialized, in creation order, so callers can audit or track them.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of regular files written.
    pub files_extracted: usize,

    /// Number of directory entries materialized.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Number of hard links created (immediately or deferred).
    pub hardlinks_created: usize,

    /// Measured bytes written to regular files.
    pub bytes_written: u64,

    /// Entries skipped because stripping emptied them, their link target was
    /// empty, or their type is not extracted.
    pub entries_skipped: usize,

    /// Wall-clock duration of the extraction.
    pub duration: Duration,

    /// Created nodes, absolute paths.
    pub created: Vec<PathBuf>,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns total number of items materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created + self.symlinks_created + self.hardlinks_created
    }
}
