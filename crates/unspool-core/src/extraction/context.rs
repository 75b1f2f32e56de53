//! State owned by a single extraction call.

use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::ArtifactTracker;
use crate::CancellationToken;
use crate::DestDir;
use crate::ExtractOptions;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::copy::CopyBuffer;
use crate::security::PathResolver;
use crate::security::strip_components;

/// Running state of one extraction: destination, options, the measured
/// byte total, collaborators and the report being built.
///
/// Not shared between calls; every extraction builds its own.
pub struct ExtractionContext<'a> {
    dest: &'a DestDir,
    options: ExtractOptions,
    bytes_written: u64,
    started: Instant,
    pub(crate) cancel: &'a dyn CancellationToken,
    pub(crate) tracker: &'a dyn ArtifactTracker,
    pub(crate) buffer: CopyBuffer,
    pub(crate) report: ExtractionReport,
}

impl std::fmt::Debug for ExtractionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionContext")
            .field("dest", &self.dest)
            .field("options", &self.options)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

impl<'a> ExtractionContext<'a> {
    /// Creates a fresh context.
    #[must_use]
    pub fn new(
        dest: &'a DestDir,
        options: ExtractOptions,
        cancel: &'a dyn CancellationToken,
        tracker: &'a dyn ArtifactTracker,
    ) -> Self {
        Self {
            dest,
            options,
            bytes_written: 0,
            started: Instant::now(),
            cancel,
            tracker,
            buffer: CopyBuffer::new(),
            report: ExtractionReport::new(),
        }
    }

    /// Returns the destination root.
    #[must_use]
    pub fn dest(&self) -> &'a DestDir {
        self.dest
    }

    /// Returns the options for this call.
    #[must_use]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Returns a resolver anchored at the destination root.
    #[must_use]
    pub fn resolver(&self) -> PathResolver<'a> {
        PathResolver::new(self.dest)
    }

    /// Measured bytes written to regular files so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Fails with [`ExtractionError::Cancelled`] once the token fires.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }
        Ok(())
    }

    /// Applies the configured strip count to an entry name or hard-link
    /// target.
    #[must_use]
    pub fn strip(&self, path: &Path) -> Option<PathBuf> {
        strip_components(path, self.options.strip_components)
    }

    /// Bytes left in the budget, or `None` when unlimited.
    #[must_use]
    pub fn remaining_budget(&self) -> Option<u64> {
        self.options
            .byte_limit()
            .map(|limit| limit.saturating_sub(self.bytes_written))
    }

    /// Rejects an entry whose declared size cannot fit the remaining budget.
    pub fn precheck(&self, declared: u64) -> Result<()> {
        let Some(limit) = self.options.byte_limit() else {
            return Ok(());
        };
        let attempted = self.bytes_written.saturating_add(declared);
        if attempted > limit {
            return Err(ExtractionError::SizeLimitExceeded { limit, attempted });
        }
        Ok(())
    }

    /// Adds measured bytes to the running total and checks the budget.
    pub fn record_written(&mut self, written: u64) -> Result<()> {
        let total = self.bytes_written.saturating_add(written);
        if let Some(limit) = self.options.byte_limit()
            && total > limit
        {
            return Err(ExtractionError::SizeLimitExceeded {
                limit,
                attempted: total,
            });
        }
        self.bytes_written = total;
        self.report.bytes_written = total;
        Ok(())
    }

    /// Counts an entry that produced no filesystem effect.
    pub fn skip(&mut self, name: &Path, why: &str) {
        tracing::debug!(entry = %name.display(), why, "skipping entry");
        self.report.entries_skipped += 1;
    }

    /// Consumes the context and returns the finished report.
    #[must_use]
    pub fn finish(mut self) -> ExtractionReport {
        self.report.duration = self.started.elapsed();
        self.report
    }
}
