//! High-level public API for archive extraction.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::ArtifactTracker;
use crate::CancellationToken;
use crate::DestDir;
use crate::ExtractOptions;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::NeverCancel;
use crate::NoopTracker;
use crate::Result;
use crate::extraction::ExtractionContext;
use crate::formats::ArchiveFormat;
use crate::formats::TarArchive;
use crate::formats::ZipArchive;
use crate::formats::detect::ArchiveType;
use crate::formats::detect::detect_format;

/// Extracts `archive`, already identified as `format`, into `dest`.
///
/// This is the dispatcher: it opens the archive, wraps it in the
/// decompressor the format calls for, and drives the matching format
/// extractor. Nothing is opened for [`ArchiveType::Unknown`].
///
/// Partial artifacts left behind by a failed extraction stay registered
/// with `tracker`; call [`CleanupTracker::cleanup`](crate::CleanupTracker::cleanup)
/// to remove them.
///
/// # Errors
///
/// Returns [`ExtractionError::UnsupportedFormat`] for unknown formats,
/// [`ExtractionError::Cancelled`] if `cancel` fires, and any error raised
/// while materializing entries.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use unspool_core::CleanupTracker;
/// use unspool_core::DestDir;
/// use unspool_core::ExtractOptions;
/// use unspool_core::NeverCancel;
/// use unspool_core::detect_format;
/// use unspool_core::extract;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = Path::new("release.tar.gz");
/// let dest = DestDir::create("/tmp/release")?;
/// let options = ExtractOptions::new().with_strip_components(1);
/// let tracker = CleanupTracker::new();
///
/// let format = detect_format(archive)?;
/// if let Err(e) = extract(archive, format, &dest, &options, &NeverCancel, &tracker) {
///     tracker.cleanup();
///     return Err(e.into());
/// }
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(
    skip_all,
    fields(archive = %archive.display(), format = %format, dest = %dest.as_path().display())
)]
pub fn extract(
    archive: &Path,
    format: ArchiveType,
    dest: &DestDir,
    options: &ExtractOptions,
    cancel: &dyn CancellationToken,
    tracker: &dyn ArtifactTracker,
) -> Result<ExtractionReport> {
    if cancel.is_cancelled() {
        return Err(ExtractionError::Cancelled);
    }
    if format == ArchiveType::Unknown {
        return Err(ExtractionError::UnsupportedFormat);
    }

    let mut ctx = ExtractionContext::new(dest, *options, cancel, tracker);
    let file = File::open(archive)?;

    match format {
        ArchiveType::Tar => TarArchive::new(BufReader::new(file)).extract(&mut ctx)?,
        ArchiveType::Gzip | ArchiveType::Bzip2 | ArchiveType::Xz | ArchiveType::Zstd => {
            let Some(codec) = format.compression() else {
                return Err(ExtractionError::UnsupportedFormat);
            };
            TarArchive::new(codec.decoder(file)?).extract(&mut ctx)?;
        }
        ArchiveType::Zip => ZipArchive::new(BufReader::new(file))?.extract(&mut ctx)?,
        ArchiveType::Unknown => return Err(ExtractionError::UnsupportedFormat),
    }

    let report = ctx.finish();
    tracing::info!(
        files = report.files_extracted,
        directories = report.directories_created,
        symlinks = report.symlinks_created,
        hardlinks = report.hardlinks_created,
        bytes = report.bytes_written,
        "extraction complete"
    );
    Ok(report)
}

/// Detects the format of `archive_path` and extracts it into an existing
/// `output_dir`.
///
/// Runs without cancellation and without artifact tracking; use
/// [`extract`] or [`ArchiveBuilder`](crate::ArchiveBuilder) for control
/// over either.
///
/// # Errors
///
/// Returns an error if the archive cannot be read, its format is not
/// supported, `output_dir` is not an existing directory, or extraction
/// fails.
///
/// # Examples
///
/// ```no_run
/// use unspool_core::ExtractOptions;
/// use unspool_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = extract_archive("archive.tar.gz", "/tmp/output", &ExtractOptions::default())?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    output_dir: Q,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    let archive_path = archive_path.as_ref();
    let format = detect_format(archive_path)?;
    let dest = DestDir::new(output_dir.as_ref())?;
    extract(archive_path, format, &dest, options, &NeverCancel, &NoopTracker)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::CleanupTracker;
    use crate::test_utils::TarTestBuilder;
    use crate::test_utils::ZipTestBuilder;
    use std::io::Write;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn write_archive(dir: &TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    fn fresh_dest(dir: &TempDir, name: &str) -> DestDir {
        DestDir::create(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_extract_unknown_format() {
        let temp = TempDir::new().unwrap();
        let dest = fresh_dest(&temp, "out");
        // Never opened, so the path need not exist
        let err = extract(
            Path::new("missing.bin"),
            ArchiveType::Unknown,
            &dest,
            &ExtractOptions::new(),
            &NeverCancel,
            &NoopTracker,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat));
    }

    #[test]
    fn test_extract_cancelled_up_front() {
        let temp = TempDir::new().unwrap();
        let dest = fresh_dest(&temp, "out");
        let cancel = AtomicBool::new(true);
        let err = extract(
            Path::new("missing.tar"),
            ArchiveType::Tar,
            &dest,
            &ExtractOptions::new(),
            &cancel,
            &NoopTracker,
        )
        .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_extract_missing_archive() {
        let temp = TempDir::new().unwrap();
        let dest = fresh_dest(&temp, "out");
        let err = extract(
            &temp.path().join("missing.tar"),
            ArchiveType::Tar,
            &dest,
            &ExtractOptions::new(),
            &NeverCancel,
            &NoopTracker,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }

    #[test]
    fn test_extract_tar() {
        let temp = TempDir::new().unwrap();
        let data = TarTestBuilder::new().add_file("a.txt", b"hello").build();
        let archive = write_archive(&temp, "a.tar", &data);
        let dest = fresh_dest(&temp, "out");

        let report = extract(
            &archive,
            ArchiveType::Tar,
            &dest,
            &ExtractOptions::new(),
            &NeverCancel,
            &NoopTracker,
        )
        .unwrap();
        assert_eq!(report.files_extracted, 1);
        assert_eq!(std::fs::read(dest.as_path().join("a.txt")).unwrap(), b"hello");
    }

    #[test]
    fn test_extract_gzip_tar() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let temp = TempDir::new().unwrap();
        let tar = TarTestBuilder::new().add_file("gz.txt", b"gzipped").build();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar).unwrap();
        let archive = write_archive(&temp, "a.tar.gz", &encoder.finish().unwrap());
        let dest = fresh_dest(&temp, "out");

        extract(
            &archive,
            ArchiveType::Gzip,
            &dest,
            &ExtractOptions::new(),
            &NeverCancel,
            &NoopTracker,
        )
        .unwrap();
        assert_eq!(std::fs::read(dest.as_path().join("gz.txt")).unwrap(), b"gzipped");
    }

    #[test]
    fn test_extract_zip_leaves_nothing_tracked() {
        let temp = TempDir::new().unwrap();
        let data = ZipTestBuilder::new().add_file("z.txt", b"zipped").build();
        let archive = write_archive(&temp, "a.zip", &data);
        let dest = fresh_dest(&temp, "out");
        let tracker = CleanupTracker::new();

        extract(
            &archive,
            ArchiveType::Zip,
            &dest,
            &ExtractOptions::new(),
            &NeverCancel,
            &tracker,
        )
        .unwrap();
        assert!(tracker.is_empty());
        assert!(dest.as_path().join("z.txt").exists());
    }

    #[test]
    fn test_extract_archive_detects_format() {
        let temp = TempDir::new().unwrap();
        let data = ZipTestBuilder::new().add_file("z.txt", b"zipped").build();
        // Misleading extension: detection only looks at content
        let archive = write_archive(&temp, "archive.tar", &data);
        let out = temp.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let report = extract_archive(&archive, &out, &ExtractOptions::default()).unwrap();
        assert_eq!(report.files_extracted, 1);
    }

    #[test]
    fn test_extract_archive_unknown_content() {
        let temp = TempDir::new().unwrap();
        let archive = write_archive(&temp, "notes.txt", b"just some text");
        let err = extract_archive(&archive, temp.path(), &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat));
    }
}
