//! Archive handle and extraction builder.

use std::path::Path;
use std::path::PathBuf;

use crate::ArtifactTracker;
use crate::CancellationToken;
use crate::DestDir;
use crate::ExtractOptions;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::NeverCancel;
use crate::NoopTracker;
use crate::Result;
use crate::formats::detect::ArchiveType;
use crate::formats::detect::detect_format;

/// An archive file whose format has been sniffed.
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    format: ArchiveType,
    options: ExtractOptions,
}

impl Archive {
    /// Opens `path` and detects its format from the leading bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read. An unrecognized format
    /// is not an error here; [`Archive::extract`] rejects it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = detect_format(&path)?;
        Ok(Self {
            path,
            format,
            options: ExtractOptions::default(),
        })
    }

    /// Replaces the extraction options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the path to the archive file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the detected format.
    #[must_use]
    pub fn format(&self) -> ArchiveType {
        self.format
    }

    /// Returns the extraction options.
    #[must_use]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extracts the archive into an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `output_dir` is not a directory or extraction
    /// fails.
    pub fn extract<P: AsRef<Path>>(&self, output_dir: P) -> Result<ExtractionReport> {
        let dest = DestDir::new(output_dir.as_ref())?;
        self.extract_into(&dest, &NeverCancel, &NoopTracker)
    }

    /// Extracts into `dest` with explicit collaborators.
    ///
    /// # Errors
    ///
    /// See [`extract`](crate::extract).
    pub fn extract_into(
        &self,
        dest: &DestDir,
        cancel: &dyn CancellationToken,
        tracker: &dyn ArtifactTracker,
    ) -> Result<ExtractionReport> {
        crate::api::extract(&self.path, self.format, dest, &self.options, cancel, tracker)
    }
}

/// Builder for configuring archive extraction.
///
/// # Examples
///
/// ```no_run
/// use unspool_core::ArchiveBuilder;
/// use unspool_core::CleanupTracker;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tracker = CleanupTracker::new();
/// let report = ArchiveBuilder::new()
///     .archive("archive.tar.gz")
///     .output_dir("/tmp/output")
///     .create_output_dir(true)
///     .strip_components(1)
///     .max_bytes(1 << 30)
///     .tracker(&tracker)
///     .extract()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ArchiveBuilder<'a> {
    archive_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    create_output_dir: bool,
    options: ExtractOptions,
    cancel: Option<&'a dyn CancellationToken>,
    tracker: Option<&'a dyn ArtifactTracker>,
}

impl std::fmt::Debug for ArchiveBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveBuilder")
            .field("archive_path", &self.archive_path)
            .field("output_dir", &self.output_dir)
            .field("create_output_dir", &self.create_output_dir)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> ArchiveBuilder<'a> {
    /// Creates a new `ArchiveBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the archive file path.
    #[must_use]
    pub fn archive<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Creates the output directory (0755) if it does not exist.
    #[must_use]
    pub fn create_output_dir(mut self, create: bool) -> Self {
        self.create_output_dir = create;
        self
    }

    /// Replaces all extraction options.
    #[must_use]
    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the number of leading components to strip.
    #[must_use]
    pub fn strip_components(mut self, n: usize) -> Self {
        self.options = self.options.with_strip_components(n);
        self
    }

    /// Sets the byte budget; 0 means unlimited.
    #[must_use]
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.options = self.options.with_max_bytes(max_bytes);
        self
    }

    /// Sets the cancellation token polled during extraction.
    #[must_use]
    pub fn cancel(mut self, cancel: &'a dyn CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the tracker that records created artifacts.
    #[must_use]
    pub fn tracker(mut self, tracker: &'a dyn ArtifactTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Executes the extraction with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive path or output directory is not set,
    /// or if detection or extraction fails.
    pub fn extract(self) -> Result<ExtractionReport> {
        let archive_path = self
            .archive_path
            .ok_or_else(|| missing_setting("archive path not set"))?;
        let output_dir = self
            .output_dir
            .ok_or_else(|| missing_setting("output directory not set"))?;

        let dest = if self.create_output_dir {
            DestDir::create(output_dir)?
        } else {
            DestDir::new(output_dir)?
        };

        let archive = Archive::open(archive_path)?.with_options(self.options);
        archive.extract_into(
            &dest,
            self.cancel.unwrap_or(&NeverCancel),
            self.tracker.unwrap_or(&NoopTracker),
        )
    }
}

fn missing_setting(what: &str) -> ExtractionError {
    ExtractionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, what))
}
